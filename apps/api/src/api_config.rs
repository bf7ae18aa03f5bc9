use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use kasboek_application::{
    ActionLogPolicy, DEFAULT_ACTION_LOG_MAX_ENTRIES, DEFAULT_ACTION_LOG_RETENTION_DAYS,
    DEFAULT_SELECTION_MAX_AGE_HOURS, SelectionPolicy,
};
use kasboek_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendConfig {
    Memory,
    File { directory: PathBuf },
    Redis { redis_url: String, key_prefix: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub storage_backend: StorageBackendConfig,
    pub action_log_policy: ActionLogPolicy,
    pub selection_policy: SelectionPolicy,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or_default(&lookup, "API_PORT", 3001_u16)?;

        let storage_backend = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => StorageBackendConfig::Memory,
            "file" => StorageBackendConfig::File {
                directory: lookup("STORAGE_DIR")
                    .filter(|value| !value.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data/state")),
            },
            "redis" => StorageBackendConfig::Redis {
                redis_url: required_non_empty(&lookup, "REDIS_URL")?,
                key_prefix: lookup("STORAGE_KEY_PREFIX")
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| "kasboek:state".to_owned()),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be one of 'memory', 'file' or 'redis', got '{other}'"
                )));
            }
        };

        let action_log_policy = ActionLogPolicy::new(
            parse_or_default(
                &lookup,
                "ACTION_LOG_RETENTION_DAYS",
                DEFAULT_ACTION_LOG_RETENTION_DAYS,
            )?,
            parse_or_default(&lookup, "ACTION_LOG_MAX_ENTRIES", DEFAULT_ACTION_LOG_MAX_ENTRIES)?,
        )?;
        let selection_policy = SelectionPolicy::new(parse_or_default(
            &lookup,
            "SELECTION_MAX_AGE_HOURS",
            DEFAULT_SELECTION_MAX_AGE_HOURS,
        )?)?;

        Ok(Self {
            frontend_url,
            api_host,
            api_port,
            storage_backend,
            action_log_policy,
            selection_policy,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

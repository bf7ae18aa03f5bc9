use std::sync::Arc;

use kasboek_application::{
    ActionLogStore, ClientPrioritizationService, Clock, KeyValueStorage, OnboardingTourStore,
    SelectionStore, SystemClock,
};
use kasboek_core::AppError;
use kasboek_infrastructure::{
    InMemoryKeyValueStorage, JsonFileKeyValueStorage, RedisKeyValueStorage,
};
use tokio::task::JoinHandle;
use tracing::info;

use crate::api_config::{ApiConfig, StorageBackendConfig};
use crate::state::AppState;

/// Built state plus the background tasks keeping it in sync.
pub struct AppRuntime {
    pub state: AppState,
    pub background_tasks: Vec<JoinHandle<()>>,
}

pub async fn build_storage(
    config: &StorageBackendConfig,
    background_tasks: &mut Vec<JoinHandle<()>>,
) -> Result<Arc<dyn KeyValueStorage>, AppError> {
    match config {
        StorageBackendConfig::Memory => {
            info!("using in-memory state storage");
            Ok(Arc::new(InMemoryKeyValueStorage::new()))
        }
        StorageBackendConfig::File { directory } => {
            info!(directory = %directory.display(), "using file state storage");
            Ok(Arc::new(JsonFileKeyValueStorage::open(directory.clone()).await?))
        }
        StorageBackendConfig::Redis {
            redis_url,
            key_prefix,
        } => {
            let client = redis::Client::open(redis_url.as_str())
                .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
            let storage = RedisKeyValueStorage::new(client, key_prefix.clone());
            background_tasks.push(storage.spawn_change_listener().await?);
            info!(key_prefix = %key_prefix, "using redis state storage");
            Ok(Arc::new(storage))
        }
    }
}

pub async fn build_app_runtime(config: &ApiConfig) -> Result<AppRuntime, AppError> {
    let mut background_tasks = Vec::new();
    let storage = build_storage(&config.storage_backend, &mut background_tasks).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = build_app_state(
        storage,
        clock,
        config,
        &mut background_tasks,
    )
    .await;

    Ok(AppRuntime {
        state,
        background_tasks,
    })
}

pub async fn build_app_state(
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    config: &ApiConfig,
    background_tasks: &mut Vec<JoinHandle<()>>,
) -> AppState {
    let action_log_store =
        ActionLogStore::load(storage.clone(), clock.clone(), config.action_log_policy).await;
    let selection_store =
        SelectionStore::load(storage.clone(), clock.clone(), config.selection_policy).await;
    background_tasks.push(selection_store.spawn_storage_sync());

    info!(
        action_log_entries = action_log_store.count().await,
        selected_clients = selection_store.count().await,
        "client state loaded"
    );

    AppState {
        prioritization_service: ClientPrioritizationService::new(clock.clone()),
        action_log_store,
        selection_store,
        onboarding_store: OnboardingTourStore::new(storage, clock),
    }
}

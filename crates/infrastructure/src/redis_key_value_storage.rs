//! Redis-backed key-value storage with pub/sub change notifications.

use async_trait::async_trait;
use futures_util::StreamExt;
use kasboek_application::{KeyValueStorage, StorageChange};
use kasboek_core::{AppError, AppResult};
use redis::{AsyncCommands, Script};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

const SET_AND_PUBLISH_SCRIPT: &str = r#"
redis.call('SET', KEYS[1], ARGV[1])
return redis.call('PUBLISH', ARGV[2], ARGV[3])
"#;

const DELETE_AND_PUBLISH_SCRIPT: &str = r#"
if redis.call('DEL', KEYS[1]) == 1 then
  return redis.call('PUBLISH', ARGV[1], ARGV[2])
else
  return 0
end
"#;

#[derive(Debug, Serialize, Deserialize)]
struct ChangePayload {
    key: String,
    value: Option<String>,
}

/// Redis implementation of the key-value storage port.
///
/// Keys are namespaced under `key_prefix`. Every write is published on
/// `<key_prefix>:changes`; subscribers only receive those notifications once
/// [`RedisKeyValueStorage::spawn_change_listener`] is running.
#[derive(Clone)]
pub struct RedisKeyValueStorage {
    client: redis::Client,
    key_prefix: String,
    changes: broadcast::Sender<StorageChange>,
}

impl RedisKeyValueStorage {
    /// Creates a storage adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            client,
            key_prefix: key_prefix.into(),
            changes,
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    fn channel(&self) -> String {
        format!("{}:changes", self.key_prefix)
    }

    fn encode_change(key: &str, value: Option<&str>) -> AppResult<String> {
        serde_json::to_string(&ChangePayload {
            key: key.to_owned(),
            value: value.map(str::to_owned),
        })
        .map_err(|error| {
            AppError::Internal(format!("failed to encode storage change payload: {error}"))
        })
    }

    fn decode_change(payload: &str) -> AppResult<StorageChange> {
        let change = serde_json::from_str::<ChangePayload>(payload).map_err(|error| {
            AppError::Storage(format!("invalid storage change payload '{payload}': {error}"))
        })?;

        Ok(StorageChange {
            key: change.key,
            value: change.value,
        })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Storage(format!("failed to connect to redis: {error}")))
    }

    /// Subscribes to the change channel and forwards notifications to
    /// [`KeyValueStorage::subscribe`] receivers until the connection drops.
    pub async fn spawn_change_listener(&self) -> AppResult<JoinHandle<()>> {
        let channel = self.channel();
        let mut pubsub = self.client.get_async_pubsub().await.map_err(|error| {
            AppError::Storage(format!("failed to open redis pubsub connection: {error}"))
        })?;
        pubsub.subscribe(channel.as_str()).await.map_err(|error| {
            AppError::Storage(format!("failed to subscribe to '{channel}': {error}"))
        })?;

        info!(channel = %channel, "listening for storage changes");
        let changes = self.changes.clone();

        Ok(tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(message) = messages.next().await {
                let payload = match message.get_payload::<String>() {
                    Ok(payload) => payload,
                    Err(error) => {
                        warn!(error = %error, "ignoring non-text storage change payload");
                        continue;
                    }
                };

                match Self::decode_change(payload.as_str()) {
                    Ok(change) => {
                        let _ = changes.send(change);
                    }
                    Err(error) => warn!(error = %error, "ignoring storage change"),
                }
            }

            warn!(channel = %channel, "storage change feed closed");
        }))
    }
}

#[async_trait]
impl KeyValueStorage for RedisKeyValueStorage {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;
        let value: Option<String> = connection
            .get(self.key_for(key))
            .await
            .map_err(|error| AppError::Storage(format!("failed to read '{key}': {error}")))?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let payload = Self::encode_change(key, Some(value))?;
        let mut connection = self.connection().await?;

        Script::new(SET_AND_PUBLISH_SCRIPT)
            .key(self.key_for(key))
            .arg(value)
            .arg(self.channel())
            .arg(payload)
            .invoke_async::<i64>(&mut connection)
            .await
            .map_err(|error| AppError::Storage(format!("failed to write '{key}': {error}")))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let payload = Self::encode_change(key, None)?;
        let mut connection = self.connection().await?;

        Script::new(DELETE_AND_PUBLISH_SCRIPT)
            .key(self.key_for(key))
            .arg(self.channel())
            .arg(payload)
            .invoke_async::<i64>(&mut connection)
            .await
            .map_err(|error| AppError::Storage(format!("failed to remove '{key}': {error}")))?;

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

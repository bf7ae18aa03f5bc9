use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kasboek_core::AppResult;
use tokio::sync::broadcast;

/// Change observed on a storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Key that changed.
    pub key: String,
    /// New raw value, `None` when the key was removed.
    pub value: Option<String>,
}

/// Key-value persistence port for client-side state.
///
/// Values are JSON documents encoded as strings. Implementations publish
/// every successful write or removal to [`KeyValueStorage::subscribe`]
/// receivers, including writes made through the same instance.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Reads the raw value stored under a key.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores a raw value under a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Removes a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> AppResult<()>;

    /// Subscribes to changes made by any writer sharing this storage.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Time source port so retention and staleness can be tested.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

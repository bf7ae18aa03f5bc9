use std::collections::HashMap;

use async_trait::async_trait;
use kasboek_application::{KeyValueStorage, StorageChange};
use kasboek_core::AppResult;
use tokio::sync::{RwLock, broadcast};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// In-memory key-value storage.
///
/// Share one instance (behind an `Arc`) between stores to model several
/// dashboard tabs on one browser profile: each write is broadcast to every
/// subscriber.
pub struct InMemoryKeyValueStorage {
    values: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

impl InMemoryKeyValueStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Returns the number of stored keys.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Returns whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

impl Default for InMemoryKeyValueStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStorage for InMemoryKeyValueStorage {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());

        let _ = self.changes.send(StorageChange {
            key: key.to_owned(),
            value: Some(value.to_owned()),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let removed = self.values.write().await.remove(key);

        if removed.is_some() {
            let _ = self.changes.send(StorageChange {
                key: key.to_owned(),
                value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use kasboek_core::{AppError, AppResult};
use tokio::sync::broadcast;

use crate::storage_ports::{Clock, KeyValueStorage, StorageChange};

/// Storage fake that records writes and can be switched into failure mode.
pub(crate) struct RecordingStorage {
    values: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    failing: AtomicBool,
    changes: broadcast::Sender<StorageChange>,
}

impl Default for RecordingStorage {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            values: Mutex::new(HashMap::new()),
            writes: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            changes,
        }
    }
}

impl RecordingStorage {
    pub(crate) fn failing() -> Self {
        let storage = Self::default();
        storage.failing.store(true, Ordering::SeqCst);
        storage
    }

    pub(crate) fn seed(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_owned(), value.to_owned());
        }
    }

    pub(crate) fn raw(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Storage("quota exceeded".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for RecordingStorage {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.check_failure()?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.check_failure()?;
        self.values
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock storage: {error}")))?
            .insert(key.to_owned(), value.to_owned());
        self.writes.fetch_add(1, Ordering::SeqCst);
        let _ = self.changes.send(StorageChange {
            key: key.to_owned(),
            value: Some(value.to_owned()),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.check_failure()?;
        self.values
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock storage: {error}")))?
            .remove(key);
        let _ = self.changes.send(StorageChange {
            key: key.to_owned(),
            value: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// Manually advanced clock.
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        )
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}

use std::sync::Arc;

use chrono::Duration;
use kasboek_core::{AppError, AppResult};
use kasboek_domain::{
    ActionLogEntry, ActionLogEntryInput, BulkOperationResult, ReminderInfo, VatPeriod,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::persisted_json::{read_json, remove_key, write_json};
use crate::storage_ports::{Clock, KeyValueStorage};

/// Storage key holding the bulk action history.
pub const ACTION_LOG_STORAGE_KEY: &str = "kasboek:bulk-action-log";

/// Default retention window for log entries.
pub const DEFAULT_ACTION_LOG_RETENTION_DAYS: u32 = 30;

/// Default maximum number of persisted log entries.
pub const DEFAULT_ACTION_LOG_MAX_ENTRIES: usize = 100;

/// Retention rules applied to the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionLogPolicy {
    retention_days: u32,
    max_entries: usize,
}

impl ActionLogPolicy {
    /// Creates a validated policy.
    pub fn new(retention_days: u32, max_entries: usize) -> AppResult<Self> {
        if retention_days == 0 {
            return Err(AppError::Validation(
                "action log retention must be at least one day".to_owned(),
            ));
        }

        if max_entries == 0 {
            return Err(AppError::Validation(
                "action log must keep at least one entry".to_owned(),
            ));
        }

        Ok(Self {
            retention_days,
            max_entries,
        })
    }

    /// Returns the retention window.
    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }

    /// Returns the entry cap.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for ActionLogPolicy {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_ACTION_LOG_RETENTION_DAYS,
            max_entries: DEFAULT_ACTION_LOG_MAX_ENTRIES,
        }
    }
}

/// History of bulk operations, most recent first.
///
/// Storage failures never surface to callers: the store keeps working from
/// memory and logs a warning.
#[derive(Clone)]
pub struct ActionLogStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    policy: ActionLogPolicy,
    entries: Arc<RwLock<Vec<ActionLogEntry>>>,
}

impl ActionLogStore {
    /// Loads the log from storage, dropping entries past the retention window.
    pub async fn load(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        policy: ActionLogPolicy,
    ) -> Self {
        let store = Self {
            storage,
            clock,
            policy,
            entries: Arc::new(RwLock::new(Vec::new())),
        };
        store.reload().await;
        store
    }

    /// Re-reads the persisted log, replacing the in-memory entries.
    pub async fn reload(&self) {
        let persisted: Vec<ActionLogEntry> =
            read_json(self.storage.as_ref(), ACTION_LOG_STORAGE_KEY)
                .await
                .unwrap_or_default();
        let persisted_count = persisted.len();

        let cutoff = self.clock.now() - self.policy.retention();
        let mut retained: Vec<ActionLogEntry> = persisted
            .into_iter()
            .filter(|entry| entry.timestamp() >= cutoff)
            .collect();
        let unexpired_count = retained.len();
        retained.truncate(self.policy.max_entries());

        if retained.len() < persisted_count {
            debug!(
                expired = persisted_count - unexpired_count,
                over_capacity = unexpired_count - retained.len(),
                retained = retained.len(),
                "dropped action log entries on load"
            );
        }

        *self.entries.write().await = retained;
    }

    /// Returns all entries, most recent first.
    pub async fn entries(&self) -> Vec<ActionLogEntry> {
        self.entries.read().await.clone()
    }

    /// Returns the number of entries.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Finds an entry by id.
    pub async fn get_entry(&self, entry_id: &str) -> Option<ActionLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.id() == entry_id)
            .cloned()
    }

    /// Records a new entry stamped with the current time.
    pub async fn add_entry(&self, input: ActionLogEntryInput) -> ActionLogEntry {
        let entry = ActionLogEntry::new(input, self.clock.now());

        let mut entries = self.entries.write().await;
        entries.insert(0, entry.clone());
        entries.truncate(self.policy.max_entries());
        write_json(
            self.storage.as_ref(),
            ACTION_LOG_STORAGE_KEY,
            entries.as_slice(),
        )
        .await;

        let vat_period = entry.vat_period().map(|period| period.label());
        info!(
            entry_id = %entry.id(),
            action_type = entry.action_type().as_str(),
            vat_period = vat_period.as_deref(),
            success = entry.result_counts().success,
            failed = entry.result_counts().failed,
            skipped = entry.result_counts().skipped,
            "bulk action logged"
        );

        entry
    }

    /// Maps a backend bulk operation result into an entry and records it.
    pub async fn log_bulk_operation(
        &self,
        result: BulkOperationResult,
        vat_period: Option<VatPeriod>,
        reminder_info: Option<ReminderInfo>,
    ) -> ActionLogEntry {
        self.add_entry(ActionLogEntry::input_from_bulk_result(
            result,
            vat_period,
            reminder_info,
        ))
        .await
    }

    /// Empties the log in memory and in storage.
    pub async fn clear_log(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        remove_key(self.storage.as_ref(), ACTION_LOG_STORAGE_KEY).await;
        info!("bulk action log cleared");
    }
}

#[cfg(test)]
mod tests;

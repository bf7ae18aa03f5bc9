use std::sync::Arc;

use chrono::Duration;
use kasboek_core::ClientId;
use kasboek_domain::{
    ActionLogEntry, ActionLogEntryInput, BulkActionType, BulkOperationClientResult,
    BulkOperationResult, ClientResultStatus, ReminderInfo,
};

use super::{ACTION_LOG_STORAGE_KEY, ActionLogPolicy, ActionLogStore};
use crate::storage_ports::Clock;
use crate::test_support::{ManualClock, RecordingStorage};

fn recalculate_input() -> ActionLogEntryInput {
    ActionLogEntryInput {
        action_type: BulkActionType::Recalculate,
        selected_count: 1,
        client_results: Vec::new(),
        vat_period: None,
        reminder_info: None,
    }
}

async fn store_with(
    storage: Arc<RecordingStorage>,
    clock: Arc<ManualClock>,
) -> ActionLogStore {
    ActionLogStore::load(storage, clock, ActionLogPolicy::default()).await
}

#[tokio::test]
async fn add_entry_prepends_and_persists() {
    let storage = Arc::new(RecordingStorage::default());
    let clock = Arc::new(ManualClock::default());
    let store = store_with(storage.clone(), clock.clone()).await;

    let first = store.add_entry(recalculate_input()).await;
    clock.advance(Duration::minutes(5));
    let second = store.add_entry(recalculate_input()).await;

    let entries = store.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id(), second.id());
    assert_eq!(entries[1].id(), first.id());
    assert_eq!(storage.writes(), 2);

    let persisted: Vec<ActionLogEntry> = storage
        .raw(ACTION_LOG_STORAGE_KEY)
        .and_then(|raw| serde_json::from_str(raw.as_str()).ok())
        .unwrap_or_default();
    assert_eq!(persisted, entries);
}

#[tokio::test]
async fn log_is_capped_at_one_hundred_entries_dropping_the_oldest() {
    let storage = Arc::new(RecordingStorage::default());
    let clock = Arc::new(ManualClock::default());
    let store = store_with(storage.clone(), clock.clone()).await;

    let oldest = store.add_entry(recalculate_input()).await;
    for _ in 0..100 {
        clock.advance(Duration::seconds(1));
        store.add_entry(recalculate_input()).await;
    }

    assert_eq!(store.count().await, 100);
    assert!(store.get_entry(oldest.id()).await.is_none());

    let persisted: Vec<ActionLogEntry> = storage
        .raw(ACTION_LOG_STORAGE_KEY)
        .and_then(|raw| serde_json::from_str(raw.as_str()).ok())
        .unwrap_or_default();
    assert_eq!(persisted.len(), 100);
}

#[tokio::test]
async fn entries_past_retention_are_dropped_on_reload() {
    let storage = Arc::new(RecordingStorage::default());
    let clock = Arc::new(ManualClock::default());

    let expired = ActionLogEntry::new(recalculate_input(), clock.now() - Duration::days(31));
    let recent = ActionLogEntry::new(recalculate_input(), clock.now() - Duration::days(29));
    let encoded = serde_json::to_string(&vec![recent.clone(), expired]).unwrap_or_default();
    storage.seed(ACTION_LOG_STORAGE_KEY, encoded.as_str());

    let store = store_with(storage, clock).await;

    let entries = store.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id(), recent.id());
}

#[tokio::test]
async fn oversized_persisted_log_is_capped_on_load() {
    let storage = Arc::new(RecordingStorage::default());
    let clock = Arc::new(ManualClock::default());
    let now = clock.now();
    let persisted: Vec<ActionLogEntry> = (0..150_i64)
        .map(|age| ActionLogEntry::new(recalculate_input(), now - Duration::minutes(age)))
        .collect();
    let newest_id = persisted[0].id().to_owned();
    storage.seed(
        ACTION_LOG_STORAGE_KEY,
        serde_json::to_string(&persisted).unwrap_or_default().as_str(),
    );

    let store = store_with(storage, clock).await;

    assert_eq!(store.count().await, 100);
    assert_eq!(
        store.entries().await.first().map(|entry| entry.id().to_owned()),
        Some(newest_id)
    );
}

#[tokio::test]
async fn lowered_cap_applies_to_existing_entries_on_load() {
    let storage = Arc::new(RecordingStorage::default());
    let clock = Arc::new(ManualClock::default());
    let store = store_with(storage.clone(), clock.clone()).await;
    for _ in 0..10 {
        store.add_entry(recalculate_input()).await;
    }

    let policy = ActionLogPolicy::new(30, 3);
    assert!(policy.is_ok());
    let Ok(policy) = policy else { return };
    let reloaded = ActionLogStore::load(storage, clock, policy).await;

    assert_eq!(reloaded.count().await, 3);
}

#[tokio::test]
async fn log_bulk_operation_maps_backend_result() {
    let storage = Arc::new(RecordingStorage::default());
    let store = store_with(storage, Arc::new(ManualClock::default())).await;

    let client_id = ClientId::new("adm-7").unwrap_or_else(|_| unreachable!());
    let entry = store
        .log_bulk_operation(
            BulkOperationResult {
                action_type: BulkActionType::SendReminders,
                total_processed: 2,
                results: vec![
                    BulkOperationClientResult {
                        client_id: client_id.clone(),
                        client_name: "Bakkerij de Vries".to_owned(),
                        status: ClientResultStatus::Failed,
                        error_message: Some("no email address".to_owned()),
                    },
                    BulkOperationClientResult {
                        client_id: ClientId::new("adm-8").unwrap_or_else(|_| unreachable!()),
                        client_name: "Studio Jansen".to_owned(),
                        status: ClientResultStatus::Success,
                        error_message: None,
                    },
                ],
            },
            None,
            Some(ReminderInfo {
                reminder_type: "DOCUMENT_MISSING".to_owned(),
                title: "Bonnetjes Q2".to_owned(),
                due_date: None,
            }),
        )
        .await;

    assert_eq!(entry.selected_count(), 2);
    assert_eq!(entry.result_counts().failed, 1);
    assert_eq!(entry.failed_client_ids(), vec![client_id]);
    assert_eq!(
        store.get_entry(entry.id()).await.map(|found| found.action_type()),
        Some(BulkActionType::SendReminders)
    );
}

#[tokio::test]
async fn clear_log_empties_memory_and_storage() {
    let storage = Arc::new(RecordingStorage::default());
    let store = store_with(storage.clone(), Arc::new(ManualClock::default())).await;
    store.add_entry(recalculate_input()).await;

    store.clear_log().await;

    assert_eq!(store.count().await, 0);
    assert!(storage.raw(ACTION_LOG_STORAGE_KEY).is_none());
}

#[tokio::test]
async fn malformed_persisted_log_loads_as_empty() {
    let storage = Arc::new(RecordingStorage::default());
    storage.seed(ACTION_LOG_STORAGE_KEY, "{not json");

    let store = store_with(storage, Arc::new(ManualClock::default())).await;

    assert_eq!(store.count().await, 0);
}

#[tokio::test]
async fn storage_failures_degrade_to_in_memory_log() {
    let storage = Arc::new(RecordingStorage::failing());
    let store = store_with(storage.clone(), Arc::new(ManualClock::default())).await;

    let entry = store.add_entry(recalculate_input()).await;

    assert_eq!(store.count().await, 1);
    assert!(store.get_entry(entry.id()).await.is_some());
    assert_eq!(storage.writes(), 0);
}

#[test]
fn policy_rejects_zero_values() {
    assert!(ActionLogPolicy::new(0, 100).is_err());
    assert!(ActionLogPolicy::new(30, 0).is_err());
    assert_eq!(
        ActionLogPolicy::new(30, 100).ok(),
        Some(ActionLogPolicy::default())
    );
}

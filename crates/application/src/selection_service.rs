use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use kasboek_core::{AppError, AppResult};
use kasboek_domain::SelectionSnapshot;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::persisted_json::{decode_json, read_json, remove_key, write_json};
use crate::storage_ports::{Clock, KeyValueStorage, StorageChange};

/// Storage key holding the bulk selection.
pub const SELECTION_STORAGE_KEY: &str = "kasboek:client-selection";

/// Default age after which a persisted selection is discarded.
pub const DEFAULT_SELECTION_MAX_AGE_HOURS: u32 = 24;

const SELECTION_CHANNEL_CAPACITY: usize = 64;

/// Staleness rule for persisted selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    max_age_hours: u32,
}

impl SelectionPolicy {
    /// Creates a validated policy.
    pub fn new(max_age_hours: u32) -> AppResult<Self> {
        if max_age_hours == 0 {
            return Err(AppError::Validation(
                "selection max age must be at least one hour".to_owned(),
            ));
        }

        Ok(Self { max_age_hours })
    }

    /// Returns the maximum age of a persisted selection.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        Duration::hours(i64::from(self.max_age_hours))
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_age_hours: DEFAULT_SELECTION_MAX_AGE_HOURS,
        }
    }
}

/// Multi-select set of client ids for bulk operations.
///
/// Every mutation is persisted and published to [`SelectionStore::subscribe`]
/// receivers before the call returns. Changes written by other stores sharing
/// the same storage arrive through [`SelectionStore::apply_storage_change`]
/// (or the task from [`SelectionStore::spawn_storage_sync`]) and are published
/// on the same channel. Concurrent writers are not coordinated: the newest
/// snapshot wins. Local writes are stamped strictly after the current
/// snapshot, so a store's own echoes never replace newer state.
#[derive(Clone)]
pub struct SelectionStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    current: Arc<RwLock<SelectionSnapshot>>,
    notifier: broadcast::Sender<SelectionSnapshot>,
}

impl SelectionStore {
    /// Loads the persisted selection, discarding it when stale.
    pub async fn load(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        policy: SelectionPolicy,
    ) -> Self {
        let now = clock.now();
        let persisted: Option<SelectionSnapshot> =
            read_json(storage.as_ref(), SELECTION_STORAGE_KEY).await;

        let snapshot = match persisted {
            Some(snapshot) if snapshot.is_stale(now, policy.max_age()) => {
                info!(
                    selected = snapshot.ids().len(),
                    updated_at = %snapshot.updated_at(),
                    "discarding stale client selection"
                );
                remove_key(storage.as_ref(), SELECTION_STORAGE_KEY).await;
                SelectionSnapshot::empty(now)
            }
            Some(snapshot) => snapshot,
            None => SelectionSnapshot::empty(now),
        };

        let (notifier, _) = broadcast::channel(SELECTION_CHANNEL_CAPACITY);
        Self {
            storage,
            clock,
            current: Arc::new(RwLock::new(snapshot)),
            notifier,
        }
    }

    /// Returns the current snapshot.
    pub async fn snapshot(&self) -> SelectionSnapshot {
        self.current.read().await.clone()
    }

    /// Returns the selected ids.
    pub async fn selected_ids(&self) -> BTreeSet<String> {
        self.current.read().await.ids().clone()
    }

    /// Returns whether an id is selected.
    pub async fn is_selected(&self, id: &str) -> bool {
        self.current.read().await.ids().contains(id)
    }

    /// Returns the number of selected ids.
    pub async fn count(&self) -> usize {
        self.current.read().await.ids().len()
    }

    /// Flips the selection state of one id.
    pub async fn toggle_select(&self, id: &str) -> SelectionSnapshot {
        self.mutate(|ids| {
            if !ids.remove(id) {
                ids.insert(id.to_owned());
            }
        })
        .await
    }

    /// Selects one id.
    pub async fn add_to_selection(&self, id: &str) -> SelectionSnapshot {
        self.mutate(|ids| {
            ids.insert(id.to_owned());
        })
        .await
    }

    /// Deselects one id.
    pub async fn remove_from_selection(&self, id: &str) -> SelectionSnapshot {
        self.mutate(|ids| {
            ids.remove(id);
        })
        .await
    }

    /// Adds several ids to the current selection.
    pub async fn select_many<I, S>(&self, new_ids: I) -> SelectionSnapshot
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutate(|ids| ids.extend(new_ids.into_iter().map(Into::into)))
            .await
    }

    /// Replaces the selection with exactly the given ids.
    pub async fn select_all<I, S>(&self, new_ids: I) -> SelectionSnapshot
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutate(|ids| *ids = new_ids.into_iter().map(Into::into).collect())
            .await
    }

    /// Replaces the selection with the clients that failed a bulk operation.
    pub async fn select_only_failed<I, S>(&self, failed_ids: I) -> SelectionSnapshot
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_all(failed_ids).await
    }

    /// Deselects everything.
    pub async fn clear_all(&self) -> SelectionSnapshot {
        self.mutate(|ids| ids.clear()).await
    }

    /// Subscribes to selection updates from this store and from other
    /// writers sharing its storage.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SelectionSnapshot> {
        self.notifier.subscribe()
    }

    /// Adopts a selection written by another store sharing the storage.
    ///
    /// Returns whether the change was applied. Changes to other keys,
    /// malformed documents, snapshots with the current ids and snapshots not
    /// newer than the current one are ignored. A removed key clears the
    /// selection.
    pub async fn apply_storage_change(&self, change: &StorageChange) -> bool {
        if change.key != SELECTION_STORAGE_KEY {
            return false;
        }

        let mut current = self.current.write().await;
        let incoming = match change.value.as_deref() {
            Some(raw) => match decode_json::<SelectionSnapshot>(SELECTION_STORAGE_KEY, raw) {
                Some(snapshot) if snapshot.updated_at() > current.updated_at() => snapshot,
                _ => return false,
            },
            None => current.successor(BTreeSet::new(), self.clock.now()),
        };

        if incoming.ids() == current.ids() {
            // Same selection written later elsewhere: keep its clock.
            if change.value.is_some() {
                *current = incoming;
            }
            return false;
        }

        debug!(
            selected = incoming.ids().len(),
            "adopting client selection from another writer"
        );
        *current = incoming.clone();
        self.publish(incoming);
        true
    }

    /// Spawns a task that feeds storage changes into
    /// [`SelectionStore::apply_storage_change`] until the storage feed closes.
    #[must_use]
    pub fn spawn_storage_sync(&self) -> JoinHandle<()> {
        let store = self.clone();
        let mut changes = self.storage.subscribe();

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        store.apply_storage_change(&change).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "selection sync lagged behind storage changes");
                        store.resync_from_storage().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn resync_from_storage(&self) {
        let raw = match self.storage.get(SELECTION_STORAGE_KEY).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(error = %error, "failed to resync client selection");
                return;
            }
        };

        self.apply_storage_change(&StorageChange {
            key: SELECTION_STORAGE_KEY.to_owned(),
            value: raw,
        })
        .await;
    }

    async fn mutate(&self, apply: impl FnOnce(&mut BTreeSet<String>)) -> SelectionSnapshot {
        let mut current = self.current.write().await;
        let mut ids = current.ids().clone();
        apply(&mut ids);

        let snapshot = current.successor(ids, self.clock.now());
        write_json(self.storage.as_ref(), SELECTION_STORAGE_KEY, &snapshot).await;
        *current = snapshot.clone();
        self.publish(snapshot.clone());

        snapshot
    }

    fn publish(&self, snapshot: SelectionSnapshot) {
        if self.notifier.send(snapshot).is_err() {
            trace!("no selection subscribers");
        }
    }
}

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Persisted multi-select state for bulk operations.
///
/// Stored as `{"ids": [...], "updatedAt": <epoch millis>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    ids: BTreeSet<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    updated_at: DateTime<Utc>,
}

impl SelectionSnapshot {
    /// Creates a snapshot from a set of ids.
    ///
    /// The timestamp is truncated to whole milliseconds, the precision it is
    /// persisted with.
    #[must_use]
    pub fn new(ids: BTreeSet<String>, updated_at: DateTime<Utc>) -> Self {
        let updated_at =
            DateTime::from_timestamp_millis(updated_at.timestamp_millis()).unwrap_or(updated_at);
        Self { ids, updated_at }
    }

    /// Creates an empty snapshot.
    #[must_use]
    pub fn empty(updated_at: DateTime<Utc>) -> Self {
        Self::new(BTreeSet::new(), updated_at)
    }

    /// Returns the selected ids.
    #[must_use]
    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    /// Consumes the snapshot and returns the ids.
    #[must_use]
    pub fn into_ids(self) -> BTreeSet<String> {
        self.ids
    }

    /// Returns when the selection was last mutated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Creates the snapshot that follows this one.
    ///
    /// It is stamped at `now`, or one millisecond after this snapshot when the
    /// clock has not moved past it, so successive writes always order.
    #[must_use]
    pub fn successor(&self, ids: BTreeSet<String>, now: DateTime<Utc>) -> Self {
        let next = Self::new(ids, now);
        if next.updated_at > self.updated_at {
            return next;
        }

        Self {
            ids: next.ids,
            updated_at: self.updated_at + Duration::milliseconds(1),
        }
    }

    /// Returns whether the snapshot is older than `max_age` at `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.updated_at > max_age
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone, Utc};

    use super::SelectionSnapshot;

    #[test]
    fn successor_is_strictly_newer_even_when_the_clock_stands_still() {
        let now = Utc
            .with_ymd_and_hms(2026, 5, 1, 8, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let first = SelectionSnapshot::empty(now);

        let second = first.successor(BTreeSet::from(["adm-1".to_owned()]), now);
        let third = second.successor(BTreeSet::new(), now - Duration::seconds(3));
        let later = third.successor(BTreeSet::new(), now + Duration::seconds(1));

        assert_eq!(second.updated_at(), now + Duration::milliseconds(1));
        assert_eq!(third.updated_at(), now + Duration::milliseconds(2));
        assert_eq!(later.updated_at(), now + Duration::seconds(1));
        assert!(third.ids().is_empty());
    }

    #[test]
    fn staleness_is_strictly_older_than_max_age() {
        let updated_at = Utc
            .with_ymd_and_hms(2026, 5, 1, 8, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let snapshot = SelectionSnapshot::empty(updated_at);

        assert!(!snapshot.is_stale(updated_at + Duration::hours(24), Duration::hours(24)));
        assert!(snapshot.is_stale(
            updated_at + Duration::hours(24) + Duration::seconds(1),
            Duration::hours(24)
        ));
    }

    #[test]
    fn persisted_shape_uses_epoch_millis() {
        let snapshot = SelectionSnapshot::new(
            BTreeSet::from(["b".to_owned(), "a".to_owned()]),
            Utc.timestamp_millis_opt(1_700_000_000_000)
                .single()
                .unwrap_or_else(Utc::now),
        );

        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        assert_eq!(json, r#"{"ids":["a","b"],"updatedAt":1700000000000}"#);
    }
}

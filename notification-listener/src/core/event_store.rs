/*!
In-memory table of the notifications currently known to the listener
*/

use tokio::sync::RwLock;
use tracing::debug;

use crate::core::record::{NotificationKey, NotificationRecord};

/// What an upsert did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// Replaced the record already stored at this position
    Replaced(usize),
}

/// Shared notification table.
///
/// Records are kept in insertion order. At most one record exists per
/// `(id, post_time)`; a repeat post replaces the stored record in place.
#[derive(Debug, Default)]
pub struct EventStore {
    records: RwLock<Vec<NotificationRecord>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, or replace the one with the same identity
    pub async fn upsert(&self, record: NotificationRecord) -> UpsertOutcome {
        let key = record.identity();
        let mut records = self.records.write().await;

        match records.iter().position(|r| r.matches(key)) {
            Some(index) => {
                records[index] = record;
                debug!("Replaced notification {} at position {}", key, index);
                UpsertOutcome::Replaced(index)
            }
            None => {
                records.push(record);
                debug!("Stored notification {} ({} total)", key, records.len());
                UpsertOutcome::Inserted
            }
        }
    }

    /// Remove every record with this identity. Returns how many were removed.
    pub async fn delete_one(&self, key: NotificationKey) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !r.matches(key));
        let removed = before - records.len();

        debug!("Deleted {} record(s) for {}", removed, key);
        removed
    }

    /// Clear the table. Returns how many records were dropped.
    pub async fn delete_all(&self) -> usize {
        let mut records = self.records.write().await;
        let removed = records.len();
        records.clear();
        removed
    }

    /// Copy of every stored record, insertion order preserved
    pub async fn snapshot(&self) -> Vec<NotificationRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Non-blocking membership check. `None` while a writer holds the table.
    pub fn try_contains(&self, key: NotificationKey) -> Option<bool> {
        self.records
            .try_read()
            .ok()
            .map(|records| records.iter().any(|r| r.matches(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::EventType;

    fn record(id: i32, post_time: i64, title: &str) -> NotificationRecord {
        NotificationRecord {
            id,
            key: NotificationKey::new(id, post_time).to_string(),
            title: title.to_string(),
            text: String::new(),
            source_id: "org.example.App".to_string(),
            source_name: "App".to_string(),
            post_time,
            dismissible: true,
            observed_at: 0,
            event_type: EventType::Posted,
        }
    }

    #[tokio::test]
    async fn upsert_appends_new_identities_in_order() {
        let store = EventStore::new();
        assert_eq!(store.upsert(record(1, 100, "a")).await, UpsertOutcome::Inserted);
        assert_eq!(store.upsert(record(2, 100, "b")).await, UpsertOutcome::Inserted);
        // same id, different post time is a different notification
        assert_eq!(store.upsert(record(1, 200, "c")).await, UpsertOutcome::Inserted);

        let titles: Vec<_> = store.snapshot().await.into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn repeat_post_replaces_in_place() {
        let store = EventStore::new();
        store.upsert(record(1, 100, "first")).await;
        store.upsert(record(2, 100, "other")).await;

        let outcome = store.upsert(record(1, 100, "second")).await;
        assert_eq!(outcome, UpsertOutcome::Replaced(0));

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].title, "second");
        assert_eq!(snapshot[1].title, "other");
    }

    #[tokio::test]
    async fn delete_missing_is_a_no_op() {
        let store = EventStore::new();
        assert_eq!(store.delete_one(NotificationKey::new(5, 100)).await, 0);

        store.upsert(record(1, 100, "keep")).await;
        assert_eq!(store.delete_one(NotificationKey::new(5, 100)).await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn delete_one_and_delete_all() {
        let store = EventStore::new();
        store.upsert(record(1, 100, "a")).await;
        store.upsert(record(2, 100, "b")).await;
        store.upsert(record(3, 100, "c")).await;

        assert_eq!(store.delete_one(NotificationKey::new(2, 100)).await, 1);
        let ids: Vec<_> = store.snapshot().await.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert_eq!(store.delete_all().await, 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_later_writes() {
        let store = EventStore::new();
        store.upsert(record(1, 100, "a")).await;
        let snapshot = store.snapshot().await;

        store.delete_all().await;
        assert_eq!(snapshot.len(), 1);
    }
}

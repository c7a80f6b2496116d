// In-memory implementation of MemorialStore.
//
// Used for local development (STORAGE_BACKEND=memory) and router tests.
// Everything is lost when the process exits.

use crate::core::moderation::{
    AdminRecord, MemorialQueue, MemorialStore, Slug, StoreError, Versioned,
};
use async_trait::async_trait;
use dashmap::DashMap;

/// A queue together with the version it was last written at.
#[derive(Clone, Debug)]
struct StoredQueue {
    version: u64,
    queue: MemorialQueue,
}

/// In-memory implementation of MemorialStore.
///
/// **DashMap:**
/// The entry API holds the shard lock while we compare versions and swap the
/// queue, so two saves against the same version cannot both succeed.
pub struct InMemoryMemorialStore {
    /// Maps slug -> versioned queue
    queues: DashMap<String, StoredQueue>,
    /// Maps slug -> admin record
    admins: DashMap<String, AdminRecord>,
}

impl InMemoryMemorialStore {
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
            admins: DashMap::new(),
        }
    }
}

#[async_trait]
impl MemorialStore for InMemoryMemorialStore {
    async fn load_queue(&self, slug: &Slug) -> Result<Versioned<MemorialQueue>, StoreError> {
        Ok(self
            .queues
            .get(slug.as_str())
            .map(|entry| Versioned {
                version: entry.version,
                value: entry.queue.clone(),
            })
            .unwrap_or(Versioned {
                version: 0,
                value: MemorialQueue::default(),
            }))
    }

    async fn save_queue(
        &self,
        slug: &Slug,
        expected_version: u64,
        queue: &MemorialQueue,
    ) -> Result<u64, StoreError> {
        let mut entry = self
            .queues
            .entry(slug.as_str().to_string())
            .or_insert(StoredQueue {
                version: 0,
                queue: MemorialQueue::default(),
            });

        if entry.version != expected_version {
            return Err(StoreError::VersionConflict);
        }

        entry.version += 1;
        entry.queue = queue.clone();
        Ok(entry.version)
    }

    async fn get_admin(&self, slug: &Slug) -> Result<Option<AdminRecord>, StoreError> {
        Ok(self.admins.get(slug.as_str()).map(|record| record.clone()))
    }

    async fn put_admin(&self, slug: &Slug, record: AdminRecord) -> Result<(), StoreError> {
        self.admins.insert(slug.as_str().to_string(), record);
        Ok(())
    }
}

impl Default for InMemoryMemorialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn queue_with(ids: &[&str]) -> MemorialQueue {
        MemorialQueue {
            pending: ids
                .iter()
                .map(|id| crate::core::moderation::MemoryItem {
                    id: id.to_string(),
                    author_name: None,
                    relationship: None,
                    text: "text".to_string(),
                    submitted_at: Utc::now(),
                    photo_reference: None,
                })
                .collect(),
            approved: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_unknown_memorial_is_empty_at_version_zero() {
        let store = InMemoryMemorialStore::new();
        let slug = Slug::parse("nobody").unwrap();

        let loaded = store.load_queue(&slug).await.unwrap();
        assert_eq!(loaded.version, 0);
        assert_eq!(loaded.value, MemorialQueue::default());
    }

    #[tokio::test]
    async fn test_versions_advance_and_stale_writes_conflict() {
        let store = InMemoryMemorialStore::new();
        let slug = Slug::parse("jane-doe").unwrap();

        assert_eq!(store.save_queue(&slug, 0, &queue_with(&["a"])).await.unwrap(), 1);
        assert_eq!(
            store.save_queue(&slug, 1, &queue_with(&["a", "b"])).await.unwrap(),
            2
        );

        // A writer that read version 1 lost the race.
        let err = store
            .save_queue(&slug, 1, &queue_with(&["c"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict));

        let loaded = store.load_queue(&slug).await.unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.value.pending.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_record_is_replaced() {
        let store = InMemoryMemorialStore::new();
        let slug = Slug::parse("jane-doe").unwrap();
        let record = |token: &str| AdminRecord {
            token: token.to_string(),
            contact_email: None,
            contact_name: None,
            created_at: Utc::now(),
        };

        assert!(store.get_admin(&slug).await.unwrap().is_none());
        store.put_admin(&slug, record("first")).await.unwrap();
        store.put_admin(&slug, record("second")).await.unwrap();

        assert_eq!(store.get_admin(&slug).await.unwrap().unwrap().token, "second");
    }
}

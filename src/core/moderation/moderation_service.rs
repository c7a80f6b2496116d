// Moderation service - core business logic for visitor-submitted memories.
//
// This service handles:
// - Accepting submissions into a memorial's pending queue
// - Token-gated review (list pending, approve, reject)
// - Public listing of approved memories
// - Issuing per-memorial admin tokens with the operator master key
//
// NO HTTP dependencies here - just pure domain logic over the store ports.

use super::moderation_models::{
    photo_key, AdminProvisioning, AdminRecord, MemoryItem, MemorySubmission, Photo, Slug,
    ValidationError, Versioned,
};
use super::moderation_store::{MemorialStore, PhotoStore, StoreError};
use crate::core::notifications::{format_submission_notice, Notifier};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Appending a submission commutes with every other write, so a version
/// conflict there is retried instead of bounced back to the visitor.
const SUBMIT_ATTEMPTS: usize = 3;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wrong or missing admin token. Deliberately the same whether or not the
    /// memorial has an admin record at all.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid master key")]
    InvalidMasterKey,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A collaborator (photo storage) failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ModerationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict => ModerationError::Conflict(
                "The memorial was modified at the same time, please retry".to_string(),
            ),
            StoreError::Backend(msg) => ModerationError::Storage(msg),
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Operator-level settings injected at construction.
#[derive(Debug, Clone)]
pub struct ModerationSettings {
    /// Secret that authorizes issuing admin tokens. `None` disables provisioning.
    pub master_key: Option<String>,

    /// Base URL used to build review links, e.g. `https://memorials.example.com`.
    pub public_base_url: String,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            master_key: None,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The moderation queue.
///
/// Generic over the memorial store, the photo store and the notifier so tests
/// can swap in doubles for all three.
pub struct ModerationService<S: MemorialStore, P: PhotoStore, N: Notifier + 'static> {
    store: S,
    photos: P,
    /// Shared with the background tasks that deliver notices.
    notifier: Arc<N>,
    settings: ModerationSettings,
}

impl<S: MemorialStore, P: PhotoStore, N: Notifier + 'static> ModerationService<S, P, N> {
    pub fn new(store: S, photos: P, notifier: N, settings: ModerationSettings) -> Self {
        Self {
            store,
            photos,
            notifier: Arc::new(notifier),
            settings,
        }
    }

    /// Link to the review page of a memorial (the token is appended by the reviewer).
    pub fn review_url(&self, slug: &Slug) -> String {
        format!(
            "{}/api/review/{}",
            self.settings.public_base_url.trim_end_matches('/'),
            slug
        )
    }

    /// Accept a new memory into the pending queue and return its id.
    ///
    /// Validation happens before any write. If the queue write fails, the photo
    /// stored for it is removed again. The reviewer notification is sent in the
    /// background and never delays or fails the submission.
    pub async fn submit(
        &self,
        slug: &Slug,
        submission: MemorySubmission,
    ) -> Result<String, ModerationError> {
        let submission = submission.validate()?;
        let id = Uuid::new_v4().to_string();

        let photo_reference = match submission.photo {
            Some(photo) => Some(self.store_photo(slug, &id, photo).await?),
            None => None,
        };

        let item = MemoryItem {
            id: id.clone(),
            author_name: submission.name,
            relationship: submission.relationship,
            text: submission.text,
            submitted_at: Utc::now(),
            photo_reference,
        };

        let pending = match self.append_pending(slug, &item).await {
            Ok(pending) => pending,
            Err(e) => {
                if let Some(key) = &item.photo_reference {
                    if let Err(cleanup) = self.photos.delete_photo(key).await {
                        tracing::warn!(slug = %slug, item_id = %id, photo = %key, error = %cleanup, "Failed to remove photo of unsaved memory");
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(
            slug = %slug,
            item_id = %id,
            pending,
            has_photo = item.photo_reference.is_some(),
            "Memory submitted"
        );

        let notice = format_submission_notice(slug, &item, &self.review_url(slug));
        let notifier = Arc::clone(&self.notifier);
        let (log_slug, log_id) = (slug.to_string(), id.clone());
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&notice).await {
                tracing::warn!(slug = %log_slug, item_id = %log_id, error = %e, "Failed to notify reviewer");
            }
        });

        Ok(id)
    }

    /// Append `item` to the pending list, retrying on version conflicts.
    /// Returns the new pending count.
    async fn append_pending(&self, slug: &Slug, item: &MemoryItem) -> Result<usize, ModerationError> {
        let mut attempt = 1;
        loop {
            let Versioned {
                version,
                value: mut queue,
            } = self.store.load_queue(slug).await?;
            queue.pending.push(item.clone());

            match self.store.save_queue(slug, version, &queue).await {
                Ok(_) => return Ok(queue.pending.len()),
                Err(StoreError::VersionConflict) if attempt < SUBMIT_ATTEMPTS => {
                    tracing::debug!(slug = %slug, attempt, "Queue changed during submit, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Pending memories in submission order. Requires the memorial's admin token.
    pub async fn list_pending(
        &self,
        slug: &Slug,
        token: &str,
    ) -> Result<Vec<MemoryItem>, ModerationError> {
        self.authorize(slug, token).await?;
        Ok(self.store.load_queue(slug).await?.value.pending)
    }

    /// Approved memories in approval order. Public.
    pub async fn list_approved(&self, slug: &Slug) -> Result<Vec<MemoryItem>, ModerationError> {
        Ok(self.store.load_queue(slug).await?.value.approved)
    }

    /// Move a pending memory to the approved list. Returns how many remain pending.
    ///
    /// If the id is somehow already approved, the pending copy is still dropped
    /// but the call reports a conflict instead of publishing it twice.
    pub async fn approve(
        &self,
        slug: &Slug,
        item_id: &str,
        token: &str,
    ) -> Result<usize, ModerationError> {
        self.authorize(slug, token).await?;

        let Versioned {
            version,
            value: mut queue,
        } = self.store.load_queue(slug).await?;
        let item = queue
            .take_pending(item_id)
            .ok_or_else(|| ModerationError::NotFound("Memory not found".to_string()))?;

        let duplicate = queue.is_approved(&item.id);
        if !duplicate {
            queue.approved.push(item);
        }
        self.store.save_queue(slug, version, &queue).await?;
        let remaining = queue.pending.len();

        if duplicate {
            tracing::warn!(slug = %slug, item_id, "Memory was already approved, dropped pending copy");
            return Err(ModerationError::Conflict(
                "Memory was already approved".to_string(),
            ));
        }

        tracing::info!(slug = %slug, item_id, remaining, "Memory approved");
        Ok(remaining)
    }

    /// Discard a pending memory and its photo. Returns how many remain pending.
    pub async fn reject(
        &self,
        slug: &Slug,
        item_id: &str,
        token: &str,
    ) -> Result<usize, ModerationError> {
        self.authorize(slug, token).await?;

        let Versioned {
            version,
            value: mut queue,
        } = self.store.load_queue(slug).await?;
        let item = queue
            .take_pending(item_id)
            .ok_or_else(|| ModerationError::NotFound("Memory not found".to_string()))?;

        self.store.save_queue(slug, version, &queue).await?;
        let remaining = queue.pending.len();

        if let Some(key) = &item.photo_reference {
            // The memory is already gone; a leftover photo is unreferenced, not corrupt.
            if let Err(e) = self.photos.delete_photo(key).await {
                tracing::warn!(slug = %slug, item_id, photo = %key, error = %e, "Failed to delete photo of rejected memory");
            }
        }

        tracing::info!(slug = %slug, item_id, remaining, "Memory rejected");
        Ok(remaining)
    }

    /// Issue a fresh admin token for a memorial, replacing any previous one.
    pub async fn provision_admin(
        &self,
        slug: &Slug,
        contact: AdminProvisioning,
        master_key: &str,
    ) -> Result<String, ModerationError> {
        let authorized = match &self.settings.master_key {
            Some(expected) => !master_key.is_empty() && secrets_match(expected, master_key),
            None => false,
        };
        if !authorized {
            tracing::warn!(slug = %slug, "Rejected admin provisioning with bad master key");
            return Err(ModerationError::InvalidMasterKey);
        }

        let token = generate_token();
        let record = AdminRecord {
            token: token.clone(),
            contact_email: non_blank(contact.email),
            contact_name: non_blank(contact.name),
            created_at: Utc::now(),
        };
        self.store.put_admin(slug, record).await?;

        tracing::info!(slug = %slug, "Admin token issued");
        Ok(token)
    }

    /// Fetch a stored photo by key.
    pub async fn photo(&self, key: &str) -> Result<Option<Photo>, ModerationError> {
        self.photos
            .get_photo(key)
            .await
            .map_err(|e| ModerationError::Upstream(e.to_string()))
    }

    /// Check `token` against the memorial's admin record.
    pub async fn authorize(&self, slug: &Slug, token: &str) -> Result<(), ModerationError> {
        if token.is_empty() {
            return Err(ModerationError::InvalidToken);
        }
        match self.store.get_admin(slug).await? {
            Some(admin) if secrets_match(&admin.token, token) => Ok(()),
            _ => Err(ModerationError::InvalidToken),
        }
    }

    async fn store_photo(
        &self,
        slug: &Slug,
        id: &str,
        photo: Photo,
    ) -> Result<String, ModerationError> {
        let key = photo_key(slug, id);
        self.photos
            .put_photo(&key, photo)
            .await
            .map_err(|e| ModerationError::Upstream(e.to_string()))?;
        Ok(key)
    }
}

/// 32 random bytes, URL-safe base64 without padding.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare secrets without short-circuiting on the first differing byte.
fn secrets_match(expected: &str, given: &str) -> bool {
    let (a, b) = (expected.as_bytes(), given.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::MemorialQueue;
    use crate::core::notifications::NotifyError;
    use async_trait::async_trait;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const MASTER_KEY: &str = "operator-secret";

    /// In-memory store for testing. Clones share state so tests can inspect it.
    #[derive(Clone, Default)]
    struct MockMemorialStore {
        queues: Arc<DashMap<String, (u64, MemorialQueue)>>,
        admins: Arc<DashMap<String, AdminRecord>>,
        /// Number of upcoming saves that should fail with a version conflict.
        forced_conflicts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MemorialStore for MockMemorialStore {
        async fn load_queue(&self, slug: &Slug) -> Result<Versioned<MemorialQueue>, StoreError> {
            Ok(self
                .queues
                .get(slug.as_str())
                .map(|entry| Versioned {
                    version: entry.0,
                    value: entry.1.clone(),
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
            if self
                .forced_conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::VersionConflict);
            }

            let mut entry = self
                .queues
                .entry(slug.as_str().to_string())
                .or_insert((0, MemorialQueue::default()));
            if entry.0 != expected_version {
                return Err(StoreError::VersionConflict);
            }
            *entry = (expected_version + 1, queue.clone());
            Ok(expected_version + 1)
        }

        async fn get_admin(&self, slug: &Slug) -> Result<Option<AdminRecord>, StoreError> {
            Ok(self.admins.get(slug.as_str()).map(|r| r.clone()))
        }

        async fn put_admin(&self, slug: &Slug, record: AdminRecord) -> Result<(), StoreError> {
            self.admins.insert(slug.as_str().to_string(), record);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MockPhotoStore {
        photos: Arc<DashMap<String, Photo>>,
    }

    #[async_trait]
    impl PhotoStore for MockPhotoStore {
        async fn put_photo(&self, key: &str, photo: Photo) -> Result<(), StoreError> {
            self.photos.insert(key.to_string(), photo);
            Ok(())
        }

        async fn get_photo(&self, key: &str) -> Result<Option<Photo>, StoreError> {
            Ok(self.photos.get(key).map(|p| p.clone()))
        }

        async fn delete_photo(&self, key: &str) -> Result<(), StoreError> {
            self.photos.remove(key);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
        /// Never complete, like a chat API that stopped answering.
        hang: bool,
    }

    impl RecordingNotifier {
        /// Notices go out on a spawned task; give it a chance to run.
        async fn wait_for(&self, count: usize) -> Vec<String> {
            for _ in 0..100 {
                if self.sent.lock().unwrap().len() >= count {
                    break;
                }
                tokio::task::yield_now().await;
            }
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> Result<(), NotifyError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail {
                return Err(NotifyError::Delivery("channel unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct Harness {
        service: ModerationService<MockMemorialStore, MockPhotoStore, RecordingNotifier>,
        store: MockMemorialStore,
        photos: MockPhotoStore,
        notifier: RecordingNotifier,
    }

    fn harness_with(notifier: RecordingNotifier) -> Harness {
        let store = MockMemorialStore::default();
        let photos = MockPhotoStore::default();
        let settings = ModerationSettings {
            master_key: Some(MASTER_KEY.to_string()),
            public_base_url: "https://memorials.example.com/".to_string(),
        };
        Harness {
            service: ModerationService::new(
                store.clone(),
                photos.clone(),
                notifier.clone(),
                settings,
            ),
            store,
            photos,
            notifier,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingNotifier::default())
    }

    fn slug(raw: &str) -> Slug {
        Slug::parse(raw).unwrap()
    }

    fn memory(name: &str, text: &str) -> MemorySubmission {
        MemorySubmission {
            name: Some(name.to_string()),
            memory: text.to_string(),
            ..Default::default()
        }
    }

    fn with_photo(text: &str, len: usize) -> MemorySubmission {
        MemorySubmission {
            memory: text.to_string(),
            photo: Some(Photo {
                bytes: vec![7u8; len],
                content_type: "image/jpeg".to_string(),
            }),
            ..Default::default()
        }
    }

    async fn provision(h: &Harness, s: &Slug) -> String {
        h.service
            .provision_admin(s, AdminProvisioning::default(), MASTER_KEY)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_then_list_pending_preserves_fields() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;

        let id = h
            .service
            .submit(&s, memory("Ana", "She loved gardenias."))
            .await
            .unwrap();

        let pending = h.service.list_pending(&s, &token).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].author_name.as_deref(), Some("Ana"));
        assert_eq!(pending[0].text, "She loved gardenias.");
        assert!(pending[0].photo_reference.is_none());
    }

    #[tokio::test]
    async fn test_approve_scenario() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;
        let id = h
            .service
            .submit(&s, memory("Ana", "She loved gardenias."))
            .await
            .unwrap();
        let pending_before = h.service.list_pending(&s, &token).await.unwrap();

        let remaining = h.service.approve(&s, &id, &token).await.unwrap();

        assert_eq!(remaining, 0);
        assert!(h.service.list_pending(&s, &token).await.unwrap().is_empty());
        let approved = h.service.list_approved(&s).await.unwrap();
        assert_eq!(approved, pending_before);
    }

    #[tokio::test]
    async fn test_empty_submission_stores_nothing() {
        let h = harness();
        let s = slug("jane-doe");

        let err = h.service.submit(&s, memory("Ana", "  \n ")).await.unwrap_err();

        assert!(matches!(err, ModerationError::Validation(_)));
        assert!(h.store.queues.is_empty());
        assert!(h.notifier.wait_for(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_photo_stores_nothing() {
        let h = harness();
        let s = slug("jane-doe");

        let err = h
            .service
            .submit(&s, with_photo("A photo", 5 * 1024 * 1024 + 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ModerationError::Validation(_)));
        assert!(h.photos.photos.is_empty());
        assert!(h.store.queues.is_empty());
    }

    #[tokio::test]
    async fn test_photo_is_stored_under_slug_and_id() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;

        let id = h.service.submit(&s, with_photo("With photo", 16)).await.unwrap();

        let key = format!("jane-doe-{}", id);
        let pending = h.service.list_pending(&s, &token).await.unwrap();
        assert_eq!(pending[0].photo_reference.as_deref(), Some(key.as_str()));
        let photo = h.service.photo(&key).await.unwrap().unwrap();
        assert_eq!(photo.bytes.len(), 16);
        assert_eq!(photo.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_reject_deletes_item_and_photo() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;
        let id = h.service.submit(&s, with_photo("With photo", 16)).await.unwrap();
        h.service.submit(&s, memory("Ben", "Another one")).await.unwrap();

        let remaining = h.service.reject(&s, &id, &token).await.unwrap();

        assert_eq!(remaining, 1);
        assert!(h
            .service
            .photo(&format!("jane-doe-{}", id))
            .await
            .unwrap()
            .is_none());
        assert!(h.service.list_approved(&s).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_transition_is_not_found() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;
        let id = h.service.submit(&s, memory("Ana", "Once")).await.unwrap();

        h.service.approve(&s, &id, &token).await.unwrap();

        let err = h.service.reject(&s, &id, &token).await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
        let err = h.service.approve(&s, &id, &token).await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
        assert_eq!(h.service.list_approved(&s).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_tokens_are_rejected_regardless_of_item() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;
        let id = h.service.submit(&s, memory("Ana", "Hello")).await.unwrap();

        for bad in ["", "wrong-token"] {
            assert!(matches!(
                h.service.list_pending(&s, bad).await,
                Err(ModerationError::InvalidToken)
            ));
            assert!(matches!(
                h.service.approve(&s, &id, bad).await,
                Err(ModerationError::InvalidToken)
            ));
            assert!(matches!(
                h.service.reject(&s, "no-such-item", bad).await,
                Err(ModerationError::InvalidToken)
            ));
        }

        // The item is untouched by the failed attempts.
        assert_eq!(h.service.list_pending(&s, &token).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memorial_without_admin_rejects_every_token() {
        let h = harness();
        let s = slug("no-admin");
        h.service.submit(&s, memory("Ana", "Hello")).await.unwrap();

        let err = h.service.list_pending(&s, "anything").await.unwrap_err();
        assert!(matches!(err, ModerationError::InvalidToken));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn test_reprovisioning_invalidates_old_token() {
        let h = harness();
        let s = slug("new-memorial");

        let first = provision(&h, &s).await;
        let second = provision(&h, &s).await;

        assert_ne!(first, second);
        assert!(matches!(
            h.service.list_pending(&s, &first).await,
            Err(ModerationError::InvalidToken)
        ));
        assert!(h.service.list_pending(&s, &second).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provisioning_requires_master_key() {
        let h = harness();
        let s = slug("new-memorial");

        for bad in ["", "not-the-key"] {
            let err = h
                .service
                .provision_admin(&s, AdminProvisioning::default(), bad)
                .await
                .unwrap_err();
            assert!(matches!(err, ModerationError::InvalidMasterKey));
        }
        assert!(h.store.admins.is_empty());
    }

    #[tokio::test]
    async fn test_provisioning_disabled_without_configured_key() {
        let store = MockMemorialStore::default();
        let service = ModerationService::new(
            store.clone(),
            MockPhotoStore::default(),
            RecordingNotifier::default(),
            ModerationSettings::default(),
        );

        let err = service
            .provision_admin(&slug("any"), AdminProvisioning::default(), "")
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::InvalidMasterKey));
    }

    #[tokio::test]
    async fn test_provisioning_records_contact() {
        let h = harness();
        let s = slug("new-memorial");
        let contact = AdminProvisioning {
            email: Some(" family@example.com ".to_string()),
            name: Some("".to_string()),
        };

        let token = h.service.provision_admin(&s, contact, MASTER_KEY).await.unwrap();

        let record = h.store.admins.get("new-memorial").unwrap().clone();
        assert_eq!(record.token, token);
        assert_eq!(record.contact_email.as_deref(), Some("family@example.com"));
        assert_eq!(record.contact_name, None);
    }

    #[tokio::test]
    async fn test_duplicate_approval_drops_pending_copy_and_conflicts() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;
        let id = h.service.submit(&s, memory("Ana", "Twice")).await.unwrap();

        // Simulate a lost race: the item is already approved but still pending.
        let current = h.store.load_queue(&s).await.unwrap();
        let mut queue = current.value.clone();
        queue.approved.push(queue.pending[0].clone());
        h.store.save_queue(&s, current.version, &queue).await.unwrap();

        let err = h.service.approve(&s, &id, &token).await.unwrap_err();

        assert!(matches!(err, ModerationError::Conflict(_)));
        assert!(h.service.list_pending(&s, &token).await.unwrap().is_empty());
        assert_eq!(h.service.list_approved(&s).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_version_fails_approval_with_conflict() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;
        let id = h.service.submit(&s, memory("Ana", "Racing")).await.unwrap();

        h.store.forced_conflicts.store(1, Ordering::SeqCst);
        let err = h.service.approve(&s, &id, &token).await.unwrap_err();

        assert!(matches!(err, ModerationError::Conflict(_)));
        // Nothing was written; a retry succeeds.
        assert_eq!(h.service.list_pending(&s, &token).await.unwrap().len(), 1);
        assert_eq!(h.service.approve(&s, &id, &token).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_submit_retries_on_version_conflict() {
        let h = harness();
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;

        h.store.forced_conflicts.store(2, Ordering::SeqCst);
        h.service.submit(&s, memory("Ana", "Persistent")).await.unwrap();
        assert_eq!(h.service.list_pending(&s, &token).await.unwrap().len(), 1);

        h.store.forced_conflicts.store(SUBMIT_ATTEMPTS, Ordering::SeqCst);
        let err = h.service.submit(&s, memory("Ben", "Unlucky")).await.unwrap_err();
        assert!(matches!(err, ModerationError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_failed_queue_write_removes_stored_photo() {
        let h = harness();
        let s = slug("jane-doe");

        h.store.forced_conflicts.store(SUBMIT_ATTEMPTS, Ordering::SeqCst);
        let err = h
            .service
            .submit(&s, with_photo("Never queued", 16))
            .await
            .unwrap_err();

        assert!(matches!(err, ModerationError::Conflict(_)));
        assert!(h.photos.photos.is_empty());
        assert!(h.notifier.wait_for(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_notification_sent_with_review_link() {
        let h = harness();
        let s = slug("jane-doe");

        h.service
            .submit(&s, memory("Ana", "She loved gardenias."))
            .await
            .unwrap();

        let sent = h.notifier.wait_for(1).await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("She loved gardenias."));
        assert!(sent[0].contains("https://memorials.example.com/api/review/jane-doe"));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_submit() {
        let h = harness_with(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;

        h.service.submit(&s, memory("Ana", "Still stored")).await.unwrap();

        assert_eq!(h.service.list_pending(&s, &token).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unresponsive_notifier_does_not_delay_submit() {
        let h = harness_with(RecordingNotifier {
            hang: true,
            ..Default::default()
        });
        let s = slug("jane-doe");
        let token = provision(&h, &s).await;

        // Would never return if delivery were awaited inline.
        h.service.submit(&s, memory("Ana", "Right away")).await.unwrap();

        assert_eq!(h.service.list_pending(&s, &token).await.unwrap().len(), 1);
        assert!(h.notifier.wait_for(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let h = harness();
        let a = slug("memorial-a");
        let b = slug("memorial-b");
        let token_a = provision(&h, &a).await;
        provision(&h, &b).await;
        let id = h.service.submit(&a, memory("Ana", "For A")).await.unwrap();

        assert!(matches!(
            h.service.approve(&b, &id, &token_a).await,
            Err(ModerationError::InvalidToken)
        ));
        assert!(h.service.list_approved(&b).await.unwrap().is_empty());
    }

    #[test]
    fn test_generated_tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
    }
}

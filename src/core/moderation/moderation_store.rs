// Storage ports for the moderation queue.
//
// The core only needs get/put by key: one versioned queue record and one admin
// record per memorial, plus a blob store for photos. Implementations live in infra.

use super::moderation_models::{AdminRecord, MemorialQueue, Photo, Slug, Versioned};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// The record changed since it was read; the caller must reload and retry.
    #[error("Record was modified concurrently")]
    VersionConflict,
}

/// Key-value persistence for memorial queues and admin records.
#[async_trait]
pub trait MemorialStore: Send + Sync {
    /// Load a memorial's queue. Unknown memorials read as empty at version 0.
    async fn load_queue(&self, slug: &Slug) -> Result<Versioned<MemorialQueue>, StoreError>;

    /// Write a queue back if the stored version still equals `expected_version`.
    ///
    /// Returns the new version, or `StoreError::VersionConflict` if another
    /// writer got there first.
    async fn save_queue(
        &self,
        slug: &Slug,
        expected_version: u64,
        queue: &MemorialQueue,
    ) -> Result<u64, StoreError>;

    async fn get_admin(&self, slug: &Slug) -> Result<Option<AdminRecord>, StoreError>;

    /// Replace the admin record, invalidating any previous token.
    async fn put_admin(&self, slug: &Slug, record: AdminRecord) -> Result<(), StoreError>;
}

/// Blob storage for uploaded photos.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn put_photo(&self, key: &str, photo: Photo) -> Result<(), StoreError>;

    async fn get_photo(&self, key: &str) -> Result<Option<Photo>, StoreError>;

    /// Deleting a missing photo is not an error.
    async fn delete_photo(&self, key: &str) -> Result<(), StoreError>;
}

// Blanket implementations for boxed trait objects, so the composition root can
// pick a backend at runtime and still hand a single concrete type to the service.
#[async_trait]
impl MemorialStore for Box<dyn MemorialStore> {
    async fn load_queue(&self, slug: &Slug) -> Result<Versioned<MemorialQueue>, StoreError> {
        (**self).load_queue(slug).await
    }

    async fn save_queue(
        &self,
        slug: &Slug,
        expected_version: u64,
        queue: &MemorialQueue,
    ) -> Result<u64, StoreError> {
        (**self).save_queue(slug, expected_version, queue).await
    }

    async fn get_admin(&self, slug: &Slug) -> Result<Option<AdminRecord>, StoreError> {
        (**self).get_admin(slug).await
    }

    async fn put_admin(&self, slug: &Slug, record: AdminRecord) -> Result<(), StoreError> {
        (**self).put_admin(slug, record).await
    }
}

#[async_trait]
impl PhotoStore for Box<dyn PhotoStore> {
    async fn put_photo(&self, key: &str, photo: Photo) -> Result<(), StoreError> {
        (**self).put_photo(key, photo).await
    }

    async fn get_photo(&self, key: &str) -> Result<Option<Photo>, StoreError> {
        (**self).get_photo(key).await
    }

    async fn delete_photo(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete_photo(key).await
    }
}

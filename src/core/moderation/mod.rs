pub mod moderation_models;
pub mod moderation_service;
pub mod moderation_store;

pub use moderation_models::{
    is_valid_photo_key, AdminProvisioning, AdminRecord, MemorialQueue, MemoryItem,
    MemorySubmission, Photo, Slug, ValidationError, Versioned,
};
pub use moderation_service::{ModerationError, ModerationService, ModerationSettings};
pub use moderation_store::{MemorialStore, PhotoStore, StoreError};

// Domain models for memorial memory moderation.
//
// A memorial (identified by its slug) owns one queue of submitted memories:
// pending ones wait for a reviewer, approved ones are public. Rejected memories
// are deleted outright, so there is no third resting state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// LIMITS
// ============================================================================

/// Largest accepted photo upload (5 MiB).
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Longest accepted memory text, in characters.
pub const MAX_MEMORY_CHARS: usize = 5_000;

/// Longest accepted author name or relationship label, in characters.
pub const MAX_LABEL_CHARS: usize = 100;

/// Longest accepted memorial slug.
pub const MAX_SLUG_CHARS: usize = 100;

/// Photo content types accepted on upload. Raster formats only: photos are
/// served back from the same origin, so anything a browser could execute
/// (SVG, HTML) is refused.
pub const ALLOWED_PHOTO_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
];

// ============================================================================
// ERRORS
// ============================================================================

/// Input rejected before anything is stored. The message is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ============================================================================
// SLUG
// ============================================================================

/// Short, human-chosen identifier of a memorial page, e.g. `jane-doe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Parse a slug: lowercase ASCII letters, digits and inner hyphens only.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::new("Invalid memorial identifier");

        if raw.is_empty() || raw.len() > MAX_SLUG_CHARS {
            return Err(invalid());
        }
        if raw.starts_with('-') || raw.ends_with('-') {
            return Err(invalid());
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid());
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// STORED RECORDS
// ============================================================================

/// One submitted memory. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryItem {
    pub id: String,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(rename = "memory")]
    pub text: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,
}

/// Pending and approved memories of one memorial, in submission/approval order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorialQueue {
    #[serde(default)]
    pub pending: Vec<MemoryItem>,
    #[serde(default)]
    pub approved: Vec<MemoryItem>,
}

impl MemorialQueue {
    /// Remove a pending memory, returning it if it was there.
    pub fn take_pending(&mut self, id: &str) -> Option<MemoryItem> {
        let index = self.pending.iter().position(|item| item.id == id)?;
        Some(self.pending.remove(index))
    }

    pub fn is_approved(&self, id: &str) -> bool {
        self.approved.iter().any(|item| item.id == id)
    }
}

/// A stored value together with the version it was read at.
///
/// Version 0 means the record has never been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// Reviewer credentials for one memorial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub token: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Binary photo plus the content type it was uploaded with.
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Storage key of the photo attached to memory `id` of memorial `slug`.
pub fn photo_key(slug: &Slug, id: &str) -> String {
    format!("{}-{}", slug, id)
}

/// Photo keys are generated from slugs and UUIDs, so anything outside that
/// alphabet cannot name a stored photo.
pub fn is_valid_photo_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_SLUG_CHARS + 64
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

// ============================================================================
// REQUESTS
// ============================================================================

/// A memory as submitted by a visitor, before validation.
#[derive(Debug, Clone, Default)]
pub struct MemorySubmission {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub memory: String,
    pub photo: Option<Photo>,
}

/// A submission that passed validation. Only `MemorySubmission::validate`
/// builds one.
#[derive(Debug, Clone)]
pub struct ValidSubmission {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub text: String,
    pub photo: Option<Photo>,
}

impl MemorySubmission {
    pub fn validate(self) -> Result<ValidSubmission, ValidationError> {
        let text = self.memory.trim();
        if text.is_empty() {
            return Err(ValidationError::new("Please write a memory before submitting"));
        }
        if text.chars().count() > MAX_MEMORY_CHARS {
            return Err(ValidationError::new(format!(
                "Memory must be at most {} characters",
                MAX_MEMORY_CHARS
            )));
        }

        let name = optional_label(self.name, "Name")?;
        let relationship = optional_label(self.relationship, "Relationship")?;

        // An empty file part is what browsers send when no file was chosen.
        let photo = match self.photo {
            Some(photo) if photo.bytes.is_empty() => None,
            Some(photo) => {
                if photo.bytes.len() > MAX_PHOTO_BYTES {
                    return Err(ValidationError::new("Photo must be 5 MB or smaller"));
                }
                let content_type = normalize_photo_type(&photo.content_type).ok_or_else(|| {
                    ValidationError::new("Photo must be a JPEG, PNG, GIF, WebP or HEIC image")
                })?;
                Some(Photo {
                    bytes: photo.bytes,
                    content_type,
                })
            }
            None => None,
        };

        Ok(ValidSubmission {
            name,
            relationship,
            text: text.to_string(),
            photo,
        })
    }
}

/// Contact details recorded when an operator issues an admin token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminProvisioning {
    #[serde(default, alias = "contactEmail")]
    pub email: Option<String>,
    #[serde(default, alias = "contactName")]
    pub name: Option<String>,
}

/// Lowercased media type without parameters, if it is an accepted photo type.
fn normalize_photo_type(raw: &str) -> Option<String> {
    let media_type = raw.split(';').next()?.trim().to_ascii_lowercase();
    ALLOWED_PHOTO_TYPES
        .contains(&media_type.as_str())
        .then_some(media_type)
}

fn optional_label(value: Option<String>, field: &str) -> Result<Option<String>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_LABEL_CHARS {
        return Err(ValidationError::new(format!(
            "{} must be at most {} characters",
            field, MAX_LABEL_CHARS
        )));
    }
    Ok(Some(trimmed.to_string()))
}

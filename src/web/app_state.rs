use crate::core::moderation::{MemorialStore, ModerationService, PhotoStore};
use crate::core::notifications::Notifier;
use std::sync::Arc;

/// The moderation service with its backends chosen at startup.
pub type Moderation =
    ModerationService<Box<dyn MemorialStore>, Box<dyn PhotoStore>, Box<dyn Notifier>>;

/// Shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub moderation: Arc<Moderation>,
}

impl AppState {
    pub fn new(moderation: Moderation) -> Self {
        Self {
            moderation: Arc::new(moderation),
        }
    }
}

// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "photos/mod.rs"]
pub mod photos;

#[path = "notifications/mod.rs"]
pub mod notifications;

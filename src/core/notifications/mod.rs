pub mod formatting;
pub mod notifier;

pub use formatting::format_submission_notice;
pub use notifier::{Notifier, NotifyError};

use crate::core::notifications::{Notifier, NotifyError};
use async_trait::async_trait;

/// Fallback when no Telegram credentials are configured: the notice only goes
/// to the application log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        tracing::info!(notice = %message, "Reviewer notification (delivery disabled)");
        Ok(())
    }
}

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Fire-and-forget text delivery to the reviewer channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        (**self).notify(message).await
    }
}

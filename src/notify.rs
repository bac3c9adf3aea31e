use crate::error::NotifyError;
use async_trait::async_trait;
use tracing::info;

/// Fire-and-forget guardian notification transport. Failures are never
/// propagated to the attendance write; the caller logs and moves on.
#[async_trait]
pub trait GuardianNotifier: Send + Sync {
    async fn notify(&self, recipient: &str, message: &str) -> Result<(), NotifyError>;
}

/// Mock WhatsApp transport that logs the message instead of sending it
#[derive(Debug, Default)]
pub struct WhatsappMock;

#[async_trait]
impl GuardianNotifier for WhatsappMock {
    async fn notify(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        info!(recipient, message, "[whatsapp mock] guardian notification");
        Ok(())
    }
}

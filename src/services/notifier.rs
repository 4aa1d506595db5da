use async_trait::async_trait;

use crate::database::models::ExpiringDocument;
use crate::error::AppError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_near_expiry(&self, document: &ExpiringDocument) -> Result<(), AppError>;
}

/// Writes the notice to the log. Delivery channels plug in behind [`Notifier`].
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_near_expiry(&self, document: &ExpiringDocument) -> Result<(), AppError> {
        log::info!(
            "Near-expiry notice: document={} contract={} type={} recipient={} ends={}",
            document.id,
            document.contract_id,
            document.contract_type,
            document.principal_email,
            document.end_date
        );
        Ok(())
    }
}

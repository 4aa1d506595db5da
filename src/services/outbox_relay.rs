use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::database::{models::RelayReport, store::OutboxStore};
use crate::error::AppError;
use crate::services::event_bus::EventPublisher;

/// Moves committed outbox rows onto the bus. A row stays pending until a
/// publish succeeds, so consumers may see an event more than once.
///
/// Passes in this process run one at a time. Passes in other processes are
/// kept off the same rows by the claim taken in [`OutboxStore::claim_pending`].
#[derive(Clone)]
pub struct OutboxRelay {
    outbox: Arc<dyn OutboxStore>,
    publisher: Arc<dyn EventPublisher>,
    batch_size: i64,
    lease: Duration,
    pass: Arc<Mutex<()>>,
}

impl OutboxRelay {
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        publisher: Arc<dyn EventPublisher>,
        batch_size: i64,
        lease: Duration,
    ) -> Self {
        Self {
            outbox,
            publisher,
            batch_size: batch_size.max(1),
            lease,
            pass: Arc::new(Mutex::new(())),
        }
    }

    pub async fn relay_pending(&self) -> Result<RelayReport, AppError> {
        let _pass = self.pass.lock().await;
        let pending = self
            .outbox
            .claim_pending(self.batch_size, self.lease)
            .await?;
        let mut report = RelayReport::default();

        for message in pending {
            let published = match message.envelope() {
                Ok(envelope) => self.publisher.publish(&envelope).await,
                Err(e) => Err(AppError::from(e)),
            };

            match published {
                Ok(()) => {
                    self.outbox.mark_dispatched(message.id, Utc::now()).await?;
                    report.dispatched += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Failed to publish {} outbox message {} (attempt {}): {}",
                        message.event_type,
                        message.id,
                        message.attempts + 1,
                        e
                    );
                    self.outbox.record_failure(message.id, &e.to_string()).await?;
                    report.failed += 1;
                }
            }
        }

        if report.dispatched > 0 || report.failed > 0 {
            log::info!(
                "Outbox relay: {} dispatched, {} failed",
                report.dispatched,
                report.failed
            );
        }

        Ok(report)
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::database::models::{DomainEvent, EventEnvelope};
use crate::database::store::OutboxStore;
use crate::services::template_reconciler::{ImportTemplatesRequest, TemplateReconciler};

const CONTRACT_ACTIVATED: &str = "ContractActivated";

/// Feeds `ContractActivated` events from the bus into template import.
pub struct TemplateImportConsumer {
    reconciler: TemplateReconciler,
    outbox: Arc<dyn OutboxStore>,
    receiver: Receiver<EventEnvelope>,
    /// Every activation dispatched before this instant has reached this
    /// consumer or has been put back in the outbox.
    resume_from: DateTime<Utc>,
}

impl TemplateImportConsumer {
    /// `receiver` must be subscribed before the relay starts publishing.
    pub fn new(
        reconciler: TemplateReconciler,
        outbox: Arc<dyn OutboxStore>,
        receiver: Receiver<EventEnvelope>,
    ) -> Self {
        Self {
            reconciler,
            outbox,
            receiver,
            resume_from: Utc::now(),
        }
    }

    /// Runs until the bus closes.
    pub async fn run(mut self) {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => self.handle(&envelope).await,
                Err(RecvError::Lagged(skipped)) => self.recover_skipped(skipped).await,
                Err(RecvError::Closed) => {
                    log::info!("Event bus closed, template import consumer stopping");
                    break;
                }
            }
        }
    }

    /// Puts activations the bus dropped back in the outbox so the relay
    /// publishes them again. Import is idempotent, so events that did
    /// arrive are only reconciled twice.
    async fn recover_skipped(&mut self, skipped: u64) {
        let checkpoint = Utc::now();

        match self
            .outbox
            .requeue_dispatched(CONTRACT_ACTIVATED, self.resume_from)
            .await
        {
            Ok(requeued) => {
                log::warn!(
                    "Template import consumer lagged by {} event(s); requeued {} activation(s) dispatched since {}",
                    skipped,
                    requeued,
                    self.resume_from
                );
                self.resume_from = checkpoint;
            }
            Err(e) => {
                log::error!(
                    "Template import consumer lagged by {} event(s) and could not requeue activations since {}: {}",
                    skipped,
                    self.resume_from,
                    e
                );
            }
        }
    }

    pub async fn handle(&self, envelope: &EventEnvelope) {
        let DomainEvent::ContractActivated(event) = &envelope.event else {
            return;
        };

        let result = self
            .reconciler
            .import(&ImportTemplatesRequest::from(event))
            .await;

        if !result.errors.is_empty() {
            log::warn!(
                "Import for event {} (contract {}) had {} error(s): {}",
                envelope.id,
                event.contract_number,
                result.errors.len(),
                result.errors.join(" | ")
            );
        }
    }
}

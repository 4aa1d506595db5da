use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::database::models::EventEnvelope;
use crate::error::AppError;

/// Hands committed events to the message bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<(), AppError>;
}

/// In-process bus backed by a broadcast channel.
#[derive(Clone)]
pub struct ChannelPublisher {
    sender: broadcast::Sender<EventEnvelope>,
}

impl ChannelPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<(), AppError> {
        // No subscriber means nobody would ever see it; leave it in the outbox.
        let receivers = self.sender.send(envelope.clone()).map_err(|_| {
            AppError::EventPublish(format!(
                "No subscribers for {} event {}",
                envelope.event.event_type(),
                envelope.id
            ))
        })?;

        log::debug!(
            "Published {} event {} to {} subscriber(s)",
            envelope.event.event_type(),
            envelope.id,
            receivers
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{DeactivateUserEvent, DomainEvent, PrincipalRole};
    use chrono::Utc;

    fn envelope() -> EventEnvelope {
        EventEnvelope::new(
            DomainEvent::DeactivateUser(DeactivateUserEvent {
                email: "manager@example.com".to_string(),
                user_type: PrincipalRole::Manager,
                reason: "Contract expired".to_string(),
                deactivated_at: Utc::now(),
            }),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn publishing_without_subscribers_fails() {
        let publisher = ChannelPublisher::new(8);
        let result = publisher.publish(&envelope()).await;
        assert!(matches!(result, Err(AppError::EventPublish(_))));
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let publisher = ChannelPublisher::new(8);
        let mut receiver = publisher.subscribe();
        let sent = envelope();

        publisher.publish(&sent).await.unwrap();

        assert_eq!(receiver.recv().await.unwrap(), sent);
    }
}

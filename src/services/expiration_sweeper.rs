//! Periodic reclassification of time-bound contract documents.
//!
//! Idempotency comes from stored state only: a document already marked
//! `near_expired` is not re-notified, and a contract already `expired` never
//! fires its deactivation cascade again. Running the sweep more often is safe.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{
    models::{
        ContractStatus, ContractType, DeactivatePrincipalEvent, DeactivateUserEvent,
        DocumentStanding, DomainEvent, EventEnvelope, ExpiringDocument, PrincipalRole,
    },
    store::{DocumentStore, PrincipalDirectory},
};
use crate::error::AppError;
use crate::services::{notifier::Notifier, outbox_relay::OutboxRelay};

pub const EXPIRY_REASON: &str = "Contract document expired";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepAction {
    NearExpired,
    Expired,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepDetail {
    pub document_id: Uuid,
    pub contract_id: Uuid,
    pub end_date: NaiveDate,
    pub action: SweepAction,
    /// True only on the run that moved the contract to `expired`.
    pub cascade_fired: bool,
    pub notified: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub today: Option<NaiveDate>,
    pub near_expired_count: usize,
    pub expired_count: usize,
    pub deactivated_users: usize,
    pub deactivated_managers: usize,
    pub deactivated_guards: usize,
    pub failed_count: usize,
    pub details: Vec<SweepDetail>,
}

impl SweepResult {
    /// Counts a finished document. Counters follow the detail only.
    fn record(&mut self, swept: Swept) {
        let Swept { detail, queued } = swept;

        match detail.action {
            SweepAction::NearExpired => self.near_expired_count += 1,
            SweepAction::Expired => {
                self.expired_count += 1;
                for envelope in &queued {
                    match envelope.event {
                        DomainEvent::DeactivateUser(_) => self.deactivated_users += 1,
                        DomainEvent::DeactivateManager(_) => self.deactivated_managers += 1,
                        DomainEvent::DeactivateGuard(_) => self.deactivated_guards += 1,
                        DomainEvent::ContractActivated(_) => {}
                    }
                }
            }
            SweepAction::Failed => {
                log::warn!(
                    "Sweep failed for document {} of contract {}: {}",
                    detail.document_id,
                    detail.contract_id,
                    detail.error.as_deref().unwrap_or("unknown error")
                );
                self.failed_count += 1;
            }
        }
        self.details.push(detail);
    }
}

/// One document's outcome plus the cascade it queued, if any.
struct Swept {
    detail: SweepDetail,
    queued: Vec<EventEnvelope>,
}

#[derive(Clone)]
pub struct ExpirationSweeper {
    documents: Arc<dyn DocumentStore>,
    principals: Arc<dyn PrincipalDirectory>,
    notifier: Arc<dyn Notifier>,
    relay: Arc<OutboxRelay>,
    offset: FixedOffset,
    near_expiry_days: u64,
    item_timeout: Duration,
}

impl ExpirationSweeper {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        principals: Arc<dyn PrincipalDirectory>,
        notifier: Arc<dyn Notifier>,
        relay: Arc<OutboxRelay>,
        offset: FixedOffset,
        near_expiry_days: i64,
        item_timeout: Duration,
    ) -> Self {
        Self {
            documents,
            principals,
            notifier,
            relay,
            offset,
            near_expiry_days: near_expiry_days.max(0) as u64,
            item_timeout,
        }
    }

    /// The calendar day `now` falls on in the configured local zone.
    pub fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepResult, AppError> {
        let today = self.local_today(now);
        let horizon = today
            .checked_add_days(Days::new(self.near_expiry_days))
            .unwrap_or(today);

        let documents = self.documents.find_due(horizon).await?;
        log::info!(
            "Expiration sweep for {} (horizon {}): {} document(s) due",
            today,
            horizon,
            documents.len()
        );

        let mut result = SweepResult {
            today: Some(today),
            ..SweepResult::default()
        };

        for document in &documents {
            let standing = DocumentStanding::classify(document.end_date, today, horizon);
            let swept = match self.sweep_one(document, standing, now).await {
                Ok(Some(swept)) => swept,
                Ok(None) => continue,
                Err(e) => Swept {
                    detail: failed_detail(document, e.to_string()),
                    queued: Vec::new(),
                },
            };
            result.record(swept);
        }

        // Cascade events are durable already; a failed relay is picked up by the next pass.
        if let Err(e) = self.relay.relay_pending().await {
            log::warn!("Outbox relay after sweep failed: {}", e);
        }

        log::info!(
            "Expiration sweep finished: {} near-expired, {} expired, {} user / {} manager / {} guard deactivation(s), {} failed",
            result.near_expired_count,
            result.expired_count,
            result.deactivated_users,
            result.deactivated_managers,
            result.deactivated_guards,
            result.failed_count
        );

        Ok(result)
    }

    /// Each store call and the notice get their own time limit, so a slow
    /// notice cannot turn a committed reclassification into a failure.
    async fn sweep_one(
        &self,
        document: &ExpiringDocument,
        standing: DocumentStanding,
        now: DateTime<Utc>,
    ) -> Result<Option<Swept>, AppError> {
        match standing {
            DocumentStanding::Current => Ok(None),
            DocumentStanding::NearExpired => {
                let changed = self
                    .bounded(self.documents.mark_near_expired(document.id))
                    .await?;

                let mut detail = detail(document, SweepAction::NearExpired);
                if changed {
                    match self.bounded(self.notifier.notify_near_expiry(document)).await {
                        Ok(()) => detail.notified = true,
                        Err(e) => {
                            log::warn!(
                                "Near-expiry notice for document {} to {} failed: {}",
                                document.id,
                                document.principal_email,
                                e
                            );
                            detail.error = Some(e.to_string());
                        }
                    }
                }
                Ok(Some(Swept {
                    detail,
                    queued: Vec::new(),
                }))
            }
            DocumentStanding::Expired => {
                let (cascade, transition) = self
                    .bounded(async {
                        let cascade = if document.contract_status == ContractStatus::Expired {
                            Vec::new()
                        } else {
                            self.cascade_events(document, now).await?
                        };
                        let transition = self
                            .documents
                            .expire(document.id, document.contract_id, &cascade)
                            .await?;
                        Ok::<_, AppError>((cascade, transition))
                    })
                    .await?;

                let mut detail = detail(document, SweepAction::Expired);
                if !transition.fires_cascade() {
                    return Ok(Some(Swept {
                        detail,
                        queued: Vec::new(),
                    }));
                }

                detail.cascade_fired = true;
                log::info!(
                    "Contract {} expired, {} deactivation event(s) queued",
                    document.contract_id,
                    cascade.len()
                );
                Ok(Some(Swept {
                    detail,
                    queued: cascade,
                }))
            }
        }
    }

    async fn bounded<T>(
        &self,
        work: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        tokio::time::timeout(self.item_timeout, work)
            .await
            .map_err(|_| AppError::Timeout(format!("Timed out after {:?}", self.item_timeout)))?
    }

    /// A `DeactivateUser` for every principal, plus the role-specific event
    /// for managers and guards.
    async fn cascade_events(
        &self,
        document: &ExpiringDocument,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventEnvelope>, AppError> {
        let role = PrincipalRole::from(document.contract_type);
        let mut events = vec![DomainEvent::DeactivateUser(DeactivateUserEvent {
            email: document.principal_email.clone(),
            user_type: role,
            reason: EXPIRY_REASON.to_string(),
            deactivated_at: now,
        })];

        if document.contract_type != ContractType::Customer {
            let principal_id = match document.principal_id {
                Some(id) => Some(id),
                None => {
                    let found = self
                        .principals
                        .find_principal_id(&document.principal_email, role)
                        .await?;
                    if found.is_none() {
                        log::warn!(
                            "No {} found for {}; deactivation carries the email only",
                            role,
                            document.principal_email
                        );
                    }
                    found
                }
            };

            let payload = DeactivatePrincipalEvent {
                principal_id,
                email: document.principal_email.clone(),
                reason: EXPIRY_REASON.to_string(),
                deactivated_at: now,
            };
            events.push(match document.contract_type {
                ContractType::Manager => DomainEvent::DeactivateManager(payload),
                _ => DomainEvent::DeactivateGuard(payload),
            });
        }

        Ok(events
            .into_iter()
            .map(|event| EventEnvelope::new(event, now))
            .collect())
    }
}

fn detail(document: &ExpiringDocument, action: SweepAction) -> SweepDetail {
    SweepDetail {
        document_id: document.id,
        contract_id: document.contract_id,
        end_date: document.end_date,
        action,
        cascade_fired: false,
        notified: false,
        error: None,
    }
}

fn failed_detail(document: &ExpiringDocument, error: String) -> SweepDetail {
    SweepDetail {
        error: Some(error),
        ..detail(document, SweepAction::Failed)
    }
}

//! Persistence boundaries used by the scheduling services.
//!
//! Every method is one unit of work: implementations that touch more than one
//! row do so inside a single transaction.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::models::{
    ActivationCommit, Contract, ContractAggregate, EventEnvelope, ExpiringDocument,
    ExpiryTransition, OutboxMessage, PrincipalRole, Shift, ShiftTemplate, ShiftTemplateDraft,
    UpsertOutcome,
};
use crate::error::AppError;

#[async_trait]
pub trait ShiftStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>, AppError>;

    /// Non-deleted shifts at a location dated within `[from_date, to_date]`.
    async fn find_by_location_and_dates(
        &self,
        location_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
        exclude_shift_id: Option<Uuid>,
    ) -> Result<Vec<Shift>, AppError>;

    async fn insert(&self, shift: &Shift) -> Result<Shift, AppError>;

    /// Writes `shift` only if the stored version still equals `expected_version`,
    /// bumping it by one. `None` means the write was stale.
    async fn update_versioned(
        &self,
        shift: &Shift,
        expected_version: i32,
    ) -> Result<Option<Shift>, AppError>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Creates the template for `draft.template_code`, or updates the single
    /// non-deleted one already holding that code.
    async fn upsert_by_code(
        &self,
        draft: &ShiftTemplateDraft,
        actor: Option<Uuid>,
    ) -> Result<UpsertOutcome, AppError>;

    async fn find_by_contract(&self, contract_id: Uuid) -> Result<Vec<ShiftTemplate>, AppError>;
}

#[async_trait]
pub trait ContractStore: Send + Sync {
    /// Contract with customer, resolved locations and active schedules.
    /// `None` when the contract is missing or soft-deleted.
    async fn load_for_activation(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<ContractAggregate>, AppError>;

    /// Applies the status change and enqueues `event` in the outbox atomically.
    /// Fails with `Conflict` if the status moved since it was loaded.
    async fn commit_activation(
        &self,
        commit: &ActivationCommit,
        event: &EventEnvelope,
    ) -> Result<Contract, AppError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Non-deleted documents ending on or before `horizon` whose contract is not terminated.
    async fn find_due(&self, horizon: NaiveDate) -> Result<Vec<ExpiringDocument>, AppError>;

    /// Returns whether the classification actually changed.
    async fn mark_near_expired(&self, document_id: Uuid) -> Result<bool, AppError>;

    /// Marks the document expired and its contract expired. `cascade` is
    /// enqueued in the outbox only when the contract was not already expired.
    async fn expire(
        &self,
        document_id: Uuid,
        contract_id: Uuid,
        cascade: &[EventEnvelope],
    ) -> Result<ExpiryTransition, AppError>;
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Claims up to `limit` undispatched rows, oldest first, for `lease`.
    /// Rows claimed by another pass are skipped until their lease runs out.
    async fn claim_pending(
        &self,
        limit: i64,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, AppError>;

    async fn mark_dispatched(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Records the error and releases the claim so the next pass retries the row.
    async fn record_failure(&self, id: Uuid, error: &str) -> Result<(), AppError>;

    /// Marks rows of `event_type` dispatched at or after `since` as pending again.
    async fn requeue_dispatched(
        &self,
        event_type: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, AppError>;
}

#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    async fn find_principal_id(
        &self,
        email: &str,
        role: PrincipalRole,
    ) -> Result<Option<Uuid>, AppError>;
}

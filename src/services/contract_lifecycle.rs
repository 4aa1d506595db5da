//! Contract activation.
//!
//! Activation moves a contract to `schedule_shifts` and records a
//! `ContractActivated` snapshot in the outbox in the same transaction. The
//! snapshot is the only thing template import needs, so importers never read
//! contract tables.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::database::{
    models::{
        ActivateContractRequest, ActivationCommit, ActivationResult, ContractActivatedEvent,
        ContractAggregate, DomainEvent, EventEnvelope,
    },
    store::ContractStore,
};
use crate::error::AppError;
use crate::services::outbox_relay::OutboxRelay;

#[derive(Clone)]
pub struct ContractLifecycle {
    contracts: Arc<dyn ContractStore>,
    relay: Arc<OutboxRelay>,
}

impl ContractLifecycle {
    pub fn new(contracts: Arc<dyn ContractStore>, relay: Arc<OutboxRelay>) -> Self {
        Self { contracts, relay }
    }

    pub async fn activate(
        &self,
        contract_id: Uuid,
        request: ActivateContractRequest,
    ) -> Result<ActivationResult, AppError> {
        let aggregate = self
            .contracts
            .load_for_activation(contract_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", contract_id)))?;

        let contract = &aggregate.contract;
        contract
            .status
            .ensure_can_activate()
            .map_err(AppError::Conflict)?;

        let problems = activation_problems(&aggregate);
        if !problems.is_empty() {
            log::warn!(
                "Contract {} cannot be activated: {}",
                contract.contract_number,
                problems.join("; ")
            );
            return Err(AppError::Validation(problems));
        }

        let activated_at = Utc::now();
        let manager_id = request.manager_id.or(contract.manager_id);
        let envelope = EventEnvelope::new(
            DomainEvent::ContractActivated(snapshot(
                &aggregate,
                manager_id,
                activated_at,
                request.activated_by,
            )),
            activated_at,
        );

        let commit = ActivationCommit {
            contract_id,
            expected_status: contract.status,
            activated_at,
            activated_by: request.activated_by,
            manager_id,
            notes: request.notes,
            approve: contract.approved_at.is_none(),
        };

        let updated = self.contracts.commit_activation(&commit, &envelope).await?;

        log::info!(
            "Contract {} activated ({} -> {}), event {}",
            updated.contract_number,
            contract.status,
            updated.status,
            envelope.id
        );

        // The event is durable in the outbox; the background relay retries if this pass fails.
        let event_published = match self.relay.relay_pending().await {
            Ok(report) => report.failed == 0,
            Err(e) => {
                log::warn!(
                    "Outbox relay after activating {} failed: {}",
                    updated.contract_number,
                    e
                );
                false
            }
        };

        Ok(ActivationResult {
            contract_id: updated.id,
            contract_number: updated.contract_number,
            status: updated.status,
            activated_at,
            activated_by: request.activated_by,
            event_id: envelope.id,
            location_count: aggregate.locations.len(),
            schedule_count: aggregate.schedules.len(),
            event_published,
        })
    }
}

/// Every failed precondition, so callers can fix them in one go.
pub fn activation_problems(aggregate: &ContractAggregate) -> Vec<String> {
    let mut problems = Vec::new();
    let contract = &aggregate.contract;

    if aggregate.locations.is_empty() {
        problems.push("Contract has no locations".to_string());
    }
    if aggregate.schedules.is_empty() {
        problems.push("Contract has no active shift schedules".to_string());
    }
    if contract.start_date > contract.end_date {
        problems.push(format!(
            "Contract start date {} is after end date {}",
            contract.start_date, contract.end_date
        ));
    }

    problems
}

fn snapshot(
    aggregate: &ContractAggregate,
    manager_id: Option<Uuid>,
    activated_at: chrono::DateTime<Utc>,
    activated_by: Option<Uuid>,
) -> ContractActivatedEvent {
    let contract = &aggregate.contract;
    ContractActivatedEvent {
        contract_id: contract.id,
        contract_number: contract.contract_number.clone(),
        contract_title: contract.title.clone(),
        customer_id: aggregate.customer.id,
        customer_name: aggregate.customer.name.clone(),
        manager_id,
        start_date: contract.start_date,
        end_date: contract.end_date,
        auto_generate_shifts: contract.auto_generate_shifts,
        generate_shifts_advance_days: contract.generate_shifts_advance_days,
        work_on_public_holidays: contract.work_on_public_holidays,
        work_on_customer_closed_days: contract.work_on_customer_closed_days,
        locations: aggregate.locations.clone(),
        shift_schedules: aggregate.schedules.clone(),
        activated_at,
        activated_by,
    }
}

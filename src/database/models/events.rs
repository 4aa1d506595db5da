use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::PrincipalRole;
use super::location::ContractLocationSnapshot;
use super::schedule::ScheduleDefinition;

/// Full snapshot of an activated contract. Consumers never need to look anything up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractActivatedEvent {
    pub contract_id: Uuid,
    pub contract_number: String,
    pub contract_title: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub manager_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub auto_generate_shifts: bool,
    pub generate_shifts_advance_days: i32,
    pub work_on_public_holidays: bool,
    pub work_on_customer_closed_days: bool,
    pub locations: Vec<ContractLocationSnapshot>,
    pub shift_schedules: Vec<ScheduleDefinition>,
    pub activated_at: DateTime<Utc>,
    pub activated_by: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateUserEvent {
    pub email: String,
    pub user_type: PrincipalRole,
    pub reason: String,
    pub deactivated_at: DateTime<Utc>,
}

/// Role-specific deactivation, sent for managers and guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivatePrincipalEvent {
    /// `None` when no principal with this email is known; consumers fall back to the email.
    pub principal_id: Option<Uuid>,
    pub email: String,
    pub reason: String,
    pub deactivated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DomainEvent {
    ContractActivated(ContractActivatedEvent),
    DeactivateUser(DeactivateUserEvent),
    DeactivateManager(DeactivatePrincipalEvent),
    DeactivateGuard(DeactivatePrincipalEvent),
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ContractActivated(_) => "ContractActivated",
            DomainEvent::DeactivateUser(_) => "DeactivateUser",
            DomainEvent::DeactivateManager(_) => "DeactivateManager",
            DomainEvent::DeactivateGuard(_) => "DeactivateGuard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(event: DomainEvent, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at,
            event,
        }
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::ContractLocationSnapshot;
use super::macros::string_enum;
use super::schedule::ScheduleDefinition;

string_enum! {
    pub enum ContractStatus {
        Draft => "draft",
        PendingApproval => "pending_approval",
        ScheduleShifts => "schedule_shifts",
        Active => "active",
        Expired => "expired",
        Terminated => "terminated",
    }
}

impl ContractStatus {
    /// Activation is allowed from any status that is not already live or finished.
    pub fn ensure_can_activate(&self) -> Result<(), String> {
        match self {
            ContractStatus::Active => Err("Contract is already active".to_string()),
            ContractStatus::Terminated => {
                Err("Contract has been terminated and cannot be activated".to_string())
            }
            ContractStatus::Expired => {
                Err("Contract has expired and cannot be activated".to_string())
            }
            ContractStatus::Draft
            | ContractStatus::PendingApproval
            | ContractStatus::ScheduleShifts => Ok(()),
        }
    }

    /// Moving a contract to `expired`. The cascade only fires on the first transition.
    pub fn expire(self) -> ExpiryTransition {
        match self {
            ContractStatus::Expired => ExpiryTransition::AlreadyExpired,
            previous => ExpiryTransition::Expired { previous },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ExpiryTransition {
    AlreadyExpired,
    Expired { previous: ContractStatus },
}

impl ExpiryTransition {
    pub fn fires_cascade(&self) -> bool {
        matches!(self, ExpiryTransition::Expired { .. })
    }
}

impl Default for ContractStatus {
    fn default() -> Self {
        ContractStatus::Draft
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,
    pub contract_number: String,
    pub title: String,
    pub customer_id: Uuid,
    pub manager_id: Option<Uuid>,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub auto_generate_shifts: bool,
    pub generate_shifts_advance_days: i32,
    pub work_on_public_holidays: bool,
    pub work_on_customer_closed_days: bool,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub activated_at: Option<DateTime<Utc>>,
    pub activated_by: Option<Uuid>,
    pub activation_notes: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
}

/// Everything activation needs, loaded in one go.
#[derive(Debug, Clone)]
pub struct ContractAggregate {
    pub contract: Contract,
    pub customer: CustomerSummary,
    pub locations: Vec<ContractLocationSnapshot>,
    pub schedules: Vec<ScheduleDefinition>,
}

/// State change written by a successful activation.
#[derive(Debug, Clone)]
pub struct ActivationCommit {
    pub contract_id: Uuid,
    pub expected_status: ContractStatus,
    pub activated_at: DateTime<Utc>,
    pub activated_by: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub notes: Option<String>,
    /// Stamp approval too; set when the contract was never approved.
    pub approve: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActivateContractRequest {
    pub activated_by: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResult {
    pub contract_id: Uuid,
    pub contract_number: String,
    pub status: ContractStatus,
    pub activated_at: DateTime<Utc>,
    pub activated_by: Option<Uuid>,
    pub event_id: Uuid,
    pub location_count: usize,
    pub schedule_count: usize,
    /// False when the event is committed to the outbox but the bus was unreachable.
    pub event_published: bool,
}

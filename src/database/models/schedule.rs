use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time::{DayFlags, TimeOfDay};

/// One shift pattern of a contract. This is both the `shiftSchedules[]` entry
/// of `ContractActivatedEvent` and the input of template reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDefinition {
    pub schedule_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub schedule_type: String,
    pub location_id: Option<Uuid>,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub crosses_midnight: bool,
    pub duration_hours: f64,
    pub break_minutes: i32,
    pub guards_per_shift: i32,
    pub recurrence_type: String,
    #[serde(flatten)]
    pub day_flags: DayFlags,
    pub applies_on_public_holidays: bool,
    pub applies_on_weekends: bool,
    pub skip_when_closed: bool,
    pub requires_armed_guard: bool,
    pub requires_supervisor: bool,
    pub min_experience_months: i32,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

/// `contract_shift_schedules` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContractShiftScheduleRow {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub location_id: Option<Uuid>,
    pub name: String,
    pub schedule_type: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub crosses_midnight: bool,
    pub duration_hours: f64,
    pub break_minutes: i32,
    pub guards_per_shift: i32,
    pub recurrence_type: String,
    #[sqlx(flatten)]
    pub day_flags: DayFlags,
    pub applies_on_public_holidays: bool,
    pub applies_on_weekends: bool,
    pub skip_when_closed: bool,
    pub requires_armed_guard: bool,
    pub requires_supervisor: bool,
    pub min_experience_months: i32,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

impl From<ContractShiftScheduleRow> for ScheduleDefinition {
    fn from(row: ContractShiftScheduleRow) -> Self {
        Self {
            schedule_id: row.id,
            name: row.name,
            schedule_type: row.schedule_type,
            location_id: row.location_id,
            start_time: row.start_time.into(),
            end_time: row.end_time.into(),
            crosses_midnight: row.crosses_midnight,
            duration_hours: row.duration_hours,
            break_minutes: row.break_minutes,
            guards_per_shift: row.guards_per_shift,
            recurrence_type: row.recurrence_type,
            day_flags: row.day_flags,
            applies_on_public_holidays: row.applies_on_public_holidays,
            applies_on_weekends: row.applies_on_weekends,
            skip_when_closed: row.skip_when_closed,
            requires_armed_guard: row.requires_armed_guard,
            requires_supervisor: row.requires_supervisor,
            min_experience_months: row.min_experience_months,
            effective_from: row.effective_from,
            effective_to: row.effective_to,
        }
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A concrete, dated shift at a location. Times are local wall-clock timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub location_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_hours: f64,
    pub break_minutes: i32,
    pub required_guards: i32,
    pub assigned_guards: i32,
    pub description: Option<String>,
    pub version: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftInput {
    pub location_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub break_minutes: i32,
    pub required_guards: i32,
    pub description: Option<String>,
}

impl ShiftInput {
    /// Absolute start/end; an end at or before the start rolls into the next day.
    pub fn interval(&self) -> (NaiveDateTime, NaiveDateTime) {
        absolute_interval(self.shift_date, self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShiftInput {
    #[serde(flatten)]
    pub shift: ShiftInput,
    pub version: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapQuery {
    pub location_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub exclude_shift_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingShift {
    pub shift_id: Uuid,
    pub shift_date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub description: Option<String>,
}

impl From<&Shift> for ConflictingShift {
    fn from(shift: &Shift) -> Self {
        Self {
            shift_id: shift.id,
            shift_date: shift.shift_date,
            start_time: shift.start_time,
            end_time: shift.end_time,
            description: shift.description.clone(),
        }
    }
}

pub fn absolute_interval(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> (NaiveDateTime, NaiveDateTime) {
    let start_at = date.and_time(start);
    let end_day = if end <= start {
        date.succ_opt().unwrap_or(date)
    } else {
        date
    };
    (start_at, end_day.and_time(end))
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time::{DayFlags, TimeOfDay};

const FALLBACK_CODE_NAME: &str = "SCHEDULE";

/// Deterministic key of a shift template: sanitized schedule name plus start and end times.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateCode(String);

impl TemplateCode {
    pub fn derive(schedule_name: &str, start: TimeOfDay, end: TimeOfDay) -> Self {
        let sanitized: String = schedule_name
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect::<String>()
            .to_uppercase();
        let name = if sanitized.is_empty() {
            FALLBACK_CODE_NAME.to_string()
        } else {
            sanitized
        };

        Self(format!("{}-{}-{}", name, start.compact(), end.compact()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TemplateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTemplate {
    pub id: Uuid,
    pub template_code: String,
    pub contract_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
    pub break_minutes: i32,
    pub is_night_shift: bool,
    pub is_overnight: bool,
    pub crosses_midnight: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub day_flags: DayFlags,
    pub min_guards: i32,
    pub max_guards: i32,
    pub optimal_guards: i32,
    pub location_id: Option<Uuid>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lon: Option<f64>,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

/// Cached copy of the location a template belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLocation {
    pub location_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Validated template fields, written on create and on update alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTemplateDraft {
    pub template_code: TemplateCode,
    pub contract_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
    pub break_minutes: i32,
    pub is_night_shift: bool,
    pub is_overnight: bool,
    pub crosses_midnight: bool,
    pub day_flags: DayFlags,
    pub min_guards: i32,
    pub max_guards: i32,
    pub optimal_guards: i32,
    pub location: Option<TemplateLocation>,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    Created(ShiftTemplate),
    Updated(ShiftTemplate),
}

impl UpsertOutcome {
    pub fn template(&self) -> &ShiftTemplate {
        match self {
            UpsertOutcome::Created(template) | UpsertOutcome::Updated(template) => template,
        }
    }
}

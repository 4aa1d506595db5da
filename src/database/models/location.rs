use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contract location with its resolved location detail, as carried in events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContractLocationSnapshot {
    pub location_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub code: Option<String>,
    pub guards_required: i32,
    pub coverage_type: String,
    pub service_start: Option<NaiveTime>,
    pub service_end: Option<NaiveTime>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub geofence_radius_m: Option<i32>,
}

use actix_web::{HttpResponse, Result, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::AppState;
use crate::handlers::shared::{ApiResponse, optional_json};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepRequest {
    /// Defaults to the current time; set it to replay a sweep for a given instant.
    pub now: Option<DateTime<Utc>>,
}

pub async fn run_expiration_sweep(
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request: SweepRequest = optional_json(&body)?;
    let now = request.now.unwrap_or_else(Utc::now);
    let result = state.expiration_sweeper.run_sweep(now).await?;
    Ok(ApiResponse::success(result))
}

pub async fn relay_outbox(state: web::Data<AppState>) -> Result<HttpResponse> {
    let report = state.outbox_relay.relay_pending().await?;
    Ok(ApiResponse::success(report))
}

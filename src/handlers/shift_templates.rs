use actix_web::{HttpResponse, Result, web};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::ScheduleDefinition;
use crate::handlers::shared::ApiResponse;
use crate::services::template_reconciler::ImportTemplatesRequest;
use crate::services::time_validator::{self, TimeValidationInput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    pub contract_id: Uuid,
}

pub async fn import_templates(
    body: web::Json<ImportTemplatesRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let result = state.template_reconciler.import(&body).await;
    Ok(ApiResponse::success(result))
}

/// Dry run of the time rules for one schedule; nothing is written.
pub async fn validate_schedule(body: web::Json<ScheduleDefinition>) -> Result<HttpResponse> {
    let result = time_validator::validate(&TimeValidationInput::from(&*body));
    Ok(ApiResponse::success(result))
}

pub async fn get_templates(
    query: web::Query<TemplateQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let templates = state.templates.find_by_contract(query.contract_id).await?;
    Ok(ApiResponse::success(templates))
}

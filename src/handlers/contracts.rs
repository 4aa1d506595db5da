use actix_web::{HttpRequest, HttpResponse, Result, web};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::ActivateContractRequest;
use crate::handlers::shared::{ApiResponse, optional_json};
use crate::middleware::RequestIdExt;

/// Activates a contract. An empty body activates with no actor or notes.
pub async fn activate_contract(
    path: web::Path<Uuid>,
    body: web::Bytes,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let contract_id = path.into_inner();
    let request: ActivateContractRequest = optional_json(&body)?;
    log::info!(
        "Activation requested for contract {} (correlation_id={})",
        contract_id,
        req.correlation_id().unwrap_or_default()
    );

    let result = state
        .contract_lifecycle
        .activate(contract_id, request)
        .await?;

    Ok(ApiResponse::success(result))
}

use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{OverlapQuery, ShiftInput, UpdateShiftInput};
use crate::handlers::shared::ApiResponse;

pub async fn create_shift(
    input: web::Json<ShiftInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let shift = state.shift_scheduler.create_shift(input.into_inner()).await?;
    Ok(ApiResponse::created(shift))
}

pub async fn update_shift(
    path: web::Path<Uuid>,
    input: web::Json<UpdateShiftInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let UpdateShiftInput { shift, version } = input.into_inner();
    let updated = state
        .shift_scheduler
        .update_shift(path.into_inner(), shift, version)
        .await?;
    Ok(ApiResponse::success(updated))
}

pub async fn find_overlaps(
    query: web::Json<OverlapQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let conflicts = state
        .shift_scheduler
        .overlap_detector()
        .find_overlaps(
            query.location_id,
            query.date,
            query.start_time,
            query.end_time,
            query.exclude_shift_id,
        )
        .await?;
    Ok(ApiResponse::success(conflicts))
}

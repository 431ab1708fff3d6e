use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use vitrine_db::FinishingRow;

use crate::middleware::RequestId;

use super::{map_db_error, not_found, parse_id, validation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct FinishingRequest {
    pub name: String,
}

fn validate_name(rid: &str, raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(validation_error(rid, "name must be 1-100 characters"));
    }
    Ok(name.to_owned())
}

pub(super) async fn list_finishings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<FinishingRow>>>, ApiError> {
    let rows = vitrine_db::list_finishings(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn get_finishing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FinishingRow>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let row = vitrine_db::get_finishing(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn create_finishing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<FinishingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FinishingRow>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_name(rid, &body.name)?;
    let row = vitrine_db::create_finishing(&state.pool, &name)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

pub(super) async fn update_finishing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<FinishingRequest>,
) -> Result<Json<ApiResponse<FinishingRow>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let name = validate_name(rid, &body.name)?;
    let row = vitrine_db::update_finishing(&state.pool, id, &name)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn delete_finishing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let deleted = vitrine_db::delete_finishing(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(rid))
    }
}

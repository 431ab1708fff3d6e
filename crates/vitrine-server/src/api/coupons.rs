use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use vitrine_db::CouponRow;

use crate::middleware::{Caller, RequestId};

use super::{
    map_db_error, not_found, parse_id, query::QueryParams, require_admin, validation_error,
    ApiError, ApiResponse, AppState,
};

const MAX_CODE_LEN: usize = 50;

#[derive(Debug, Deserialize)]
pub(super) struct CreateCouponRequest {
    pub code: String,
    pub discount_percentage: i16,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateCouponRequest {
    pub code: Option<String>,
    pub discount_percentage: Option<i16>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(super) struct ValidCoupon {
    code: String,
    discount_percentage: i16,
}

fn validate_code(rid: &str, raw: &str) -> Result<String, ApiError> {
    let code = raw.trim();
    if code.is_empty() || code.chars().count() > MAX_CODE_LEN {
        return Err(validation_error(
            rid,
            format!("code must be 1-{MAX_CODE_LEN} characters"),
        ));
    }
    Ok(code.to_owned())
}

fn validate_percentage(rid: &str, value: i16) -> Result<i16, ApiError> {
    if (1..=100).contains(&value) {
        Ok(value)
    } else {
        Err(validation_error(
            rid,
            format!("discount_percentage must be between 1 and 100, got {value}"),
        ))
    }
}

/// GET /api/v1/coupons/validate?code=...: public, case-insensitive.
pub(super) async fn validate_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: QueryParams,
) -> Result<Json<ApiResponse<ValidCoupon>>, ApiError> {
    let rid = &req_id.0;
    let invalid = || ApiError::new(rid, "not_found", "invalid coupon");

    let code = params.text("code").ok_or_else(invalid)?;

    let coupon = vitrine_db::find_active_coupon(&state.pool, &code)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(invalid)?;

    Ok(Json(ApiResponse::new(
        ValidCoupon {
            code: coupon.code,
            discount_percentage: coupon.discount_percentage,
        },
        req_id.0,
    )))
}

/// GET /api/v1/coupons: admin only.
pub(super) async fn list_coupons(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<ApiResponse<Vec<CouponRow>>>, ApiError> {
    require_admin(&req_id.0, caller)?;
    let rows = vitrine_db::list_coupons(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// POST /api/v1/coupons
pub(super) async fn create_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CouponRow>>), ApiError> {
    let rid = &req_id.0;
    let code = validate_code(rid, &body.code)?;
    let percentage = validate_percentage(rid, body.discount_percentage)?;

    let row = vitrine_db::create_coupon(&state.pool, &code, percentage, body.is_active)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

/// PATCH /api/v1/coupons/{id}
pub(super) async fn update_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCouponRequest>,
) -> Result<Json<ApiResponse<CouponRow>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let code = body.code.as_deref().map(|c| validate_code(rid, c)).transpose()?;
    let percentage = body
        .discount_percentage
        .map(|p| validate_percentage(rid, p))
        .transpose()?;

    let row = vitrine_db::update_coupon(&state.pool, id, code.as_deref(), percentage, body.is_active)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// DELETE /api/v1/coupons/{id}
pub(super) async fn delete_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let deleted = vitrine_db::delete_coupon(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(rid))
    }
}

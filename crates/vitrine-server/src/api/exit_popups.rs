use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use vitrine_db::{ExitPopupRow, ExitPopupWrite};

use crate::middleware::{Caller, RequestId};

use super::{
    map_db_error, not_found, parse_id, require_admin, validation_error, ApiError, ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct ExitPopupRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub coupon_code: Option<String>,
    pub minimum_cart_value: Option<Decimal>,
    pub timer_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

impl ExitPopupRequest {
    fn into_write(self, rid: &str) -> Result<ExitPopupWrite, ApiError> {
        let name = self.name.map(|n| n.trim().to_owned());
        if name.as_deref() == Some("") {
            return Err(validation_error(rid, "name must not be empty"));
        }
        let coupon_code = self.coupon_code.map(|c| c.trim().to_owned());
        if coupon_code.as_deref() == Some("") {
            return Err(validation_error(rid, "coupon_code must not be empty"));
        }
        if self.minimum_cart_value.is_some_and(|v| v.is_sign_negative()) {
            return Err(validation_error(rid, "minimum_cart_value must be non-negative"));
        }
        if self.timer_minutes.is_some_and(|t| t <= 0) {
            return Err(validation_error(rid, "timer_minutes must be positive"));
        }
        Ok(ExitPopupWrite {
            name,
            title: self.title,
            message: self.message,
            coupon_code,
            minimum_cart_value: self.minimum_cart_value.map(|v| v.round_dp(2)),
            timer_minutes: self.timer_minutes,
            is_active: self.is_active,
        })
    }
}

/// GET /api/v1/exit-popup: the active popup, or `null` when none is.
pub(super) async fn current_exit_popup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Option<ExitPopupRow>>>, ApiError> {
    let row = vitrine_db::current_exit_popup(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// GET /api/v1/exit-popup/configs: admin only.
pub(super) async fn list_exit_popups(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<ApiResponse<Vec<ExitPopupRow>>>, ApiError> {
    require_admin(&req_id.0, caller)?;
    let rows = vitrine_db::list_exit_popups(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// POST /api/v1/exit-popup/configs
pub(super) async fn create_exit_popup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ExitPopupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExitPopupRow>>), ApiError> {
    let rid = &req_id.0;
    let write = body.into_write(rid)?;
    if write.name.is_none() {
        return Err(validation_error(rid, "name is required"));
    }
    if write.coupon_code.is_none() {
        return Err(validation_error(rid, "coupon_code is required"));
    }

    let row = vitrine_db::create_exit_popup(&state.pool, &write)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

/// PATCH /api/v1/exit-popup/configs/{id}: `is_active: true` deactivates
/// whichever popup was active before.
pub(super) async fn update_exit_popup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<ExitPopupRequest>,
) -> Result<Json<ApiResponse<ExitPopupRow>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let write = body.into_write(rid)?;
    let row = vitrine_db::update_exit_popup(&state.pool, id, &write)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// DELETE /api/v1/exit-popup/configs/{id}
pub(super) async fn delete_exit_popup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let deleted = vitrine_db::delete_exit_popup(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(rid))
    }
}

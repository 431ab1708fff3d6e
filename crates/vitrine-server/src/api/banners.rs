use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use vitrine_db::{BannerRow, BannerWrite};

use crate::middleware::{Caller, RequestId};

use super::{
    lenient_bool, map_db_error, not_found, nullable, parse_id, query::QueryParams,
    validation_error, ApiError, ApiResponse, AppState,
};

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct BannerRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_mobile: Option<Option<String>>,
    pub is_active: Option<bool>,
    #[serde(alias = "order")]
    pub sort_order: Option<i32>,
}

impl BannerRequest {
    fn into_write(self, rid: &str) -> Result<BannerWrite, ApiError> {
        for (field, value) in [("title", &self.title), ("subtitle", &self.subtitle)] {
            if value.as_ref().is_some_and(|v| v.chars().count() > 200) {
                return Err(validation_error(rid, format!("{field} must be at most 200 characters")));
            }
        }
        if self.sort_order.is_some_and(|o| o < 0) {
            return Err(validation_error(rid, "sort_order must be non-negative"));
        }
        let image = self.image.map(|s| s.trim().to_owned());
        if image.as_deref() == Some("") {
            return Err(validation_error(rid, "image must not be empty"));
        }
        Ok(BannerWrite {
            title: self.title,
            subtitle: self.subtitle,
            image,
            image_mobile: self.image_mobile,
            is_active: self.is_active,
            sort_order: self.sort_order,
        })
    }
}

/// GET /api/v1/banners: active banners by `sort_order`; admins may pass
/// `include_inactive=true`.
pub(super) async fn list_banners(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    params: QueryParams,
) -> Result<Json<ApiResponse<Vec<BannerRow>>>, ApiError> {
    let include_inactive =
        caller.is_admin() && lenient_bool(params.get("include_inactive")) == Some(true);
    let rows = vitrine_db::list_banners(&state.pool, include_inactive)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// POST /api/v1/banners
pub(super) async fn create_banner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BannerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BannerRow>>), ApiError> {
    let rid = &req_id.0;
    let write = body.into_write(rid)?;
    if write.image.is_none() {
        return Err(validation_error(rid, "image is required"));
    }
    let row = vitrine_db::create_banner(&state.pool, &write)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

/// PATCH /api/v1/banners/{id}
pub(super) async fn update_banner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<BannerRequest>,
) -> Result<Json<ApiResponse<BannerRow>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let write = body.into_write(rid)?;
    let row = vitrine_db::update_banner(&state.pool, id, &write)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// DELETE /api/v1/banners/{id}
pub(super) async fn delete_banner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let deleted = vitrine_db::delete_banner(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(rid))
    }
}

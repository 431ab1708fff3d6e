use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use vitrine_core::KitInput;
use vitrine_db::{KitDetail, KitFilter};

use crate::middleware::{Caller, RequestId};

use super::{
    form::WriteForm, lenient_bool, map_db_error, map_payload_error, not_found, parse_id,
    query::QueryParams, ApiError, ApiResponse, AppState,
};

/// GET /api/v1/kits
pub(super) async fn list_kits(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    params: QueryParams,
) -> Result<Json<ApiResponse<Vec<KitDetail>>>, ApiError> {
    let filter = KitFilter {
        search: params.text("search"),
        include_inactive: caller.is_admin()
            && lenient_bool(params.get("include_inactive")) == Some(true),
    };
    let kits = vitrine_db::list_kits(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(kits, req_id.0)))
}

/// GET /api/v1/kits/{id}
pub(super) async fn get_kit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<KitDetail>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let kit = vitrine_db::get_kit(&state.pool, id, caller.is_admin())
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;
    Ok(Json(ApiResponse::new(kit, req_id.0)))
}

/// GET /api/v1/kits/slug/{slug}
pub(super) async fn get_kit_by_slug(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<KitDetail>>, ApiError> {
    let rid = &req_id.0;
    let kit = vitrine_db::get_kit_by_slug(&state.pool, &slug, caller.is_admin())
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;
    Ok(Json(ApiResponse::new(kit, req_id.0)))
}

/// POST /api/v1/kits
pub(super) async fn create_kit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    WriteForm(fields): WriteForm,
) -> Result<(StatusCode, Json<ApiResponse<KitDetail>>), ApiError> {
    let rid = &req_id.0;
    let input = KitInput::from_fields(&fields).map_err(|e| map_payload_error(rid, &e))?;
    let (name, price) = input
        .required_for_create()
        .map_err(|e| map_payload_error(rid, &e))?;

    let kit = vitrine_db::create_kit(&state.pool, name, price, &input)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(kit, req_id.0))))
}

/// PATCH /api/v1/kits/{id}
pub(super) async fn update_kit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    WriteForm(fields): WriteForm,
) -> Result<Json<ApiResponse<KitDetail>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let input = KitInput::from_fields(&fields).map_err(|e| map_payload_error(rid, &e))?;

    let kit = vitrine_db::update_kit(&state.pool, id, &input)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(kit, req_id.0)))
}

/// DELETE /api/v1/kits/{id}
pub(super) async fn delete_kit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let deleted = vitrine_db::delete_kit(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(rid))
    }
}

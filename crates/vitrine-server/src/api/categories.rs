use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use vitrine_core::slugify;
use vitrine_db::CategoryRow;

use crate::middleware::RequestId;

use super::{
    map_db_error, not_found, nullable, parse_id, validation_error, ApiError, ApiResponse, AppState,
};

const MAX_CATEGORY_NAME_LEN: usize = 100;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub icon: Option<String>,
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: Option<Option<String>>,
}

fn validate_name(rid: &str, raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(validation_error(
            rid,
            format!("name must be 1-{MAX_CATEGORY_NAME_LEN} characters"),
        ));
    }
    Ok(name.to_owned())
}

fn validate_slug(rid: &str, raw: &str) -> Result<String, ApiError> {
    let slug = slugify(raw);
    if slug.is_empty() {
        return Err(validation_error(
            rid,
            format!("slug '{raw}' contains no URL-safe characters"),
        ));
    }
    Ok(slug)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/categories
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryRow>>>, ApiError> {
    let rows = vitrine_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// GET /api/v1/categories/{id}
pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CategoryRow>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let row = vitrine_db::get_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// POST /api/v1/categories
pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryRow>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_name(rid, &body.name)?;
    let slug = body
        .slug
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| validate_slug(rid, s))
        .transpose()?;
    let icon = body.icon.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let row = vitrine_db::create_category(&state.pool, &name, slug.as_deref(), icon)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(category_id = row.id, slug = %row.slug, "category created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

/// PATCH /api/v1/categories/{id}
pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryRow>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let name = body.name.as_deref().map(|n| validate_name(rid, n)).transpose()?;
    let slug = body.slug.as_deref().map(|s| validate_slug(rid, s)).transpose()?;

    let row = vitrine_db::update_category(
        &state.pool,
        id,
        name.as_deref(),
        slug.as_deref(),
        body.icon.as_ref().map(|opt| opt.as_deref()),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// DELETE /api/v1/categories/{id}
pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let deleted = vitrine_db::delete_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(rid))
    }
}

//! Product handlers: filtered listing, lookups with view counting, writes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use vitrine_core::{parse_price, PriceBounds, ProductInput};
use vitrine_db::{ProductDetail, ProductFilter};

use crate::middleware::{Caller, RequestId};

use super::{
    form::WriteForm, lenient, lenient_bool, map_db_error, map_payload_error, normalize_limit,
    not_found, parse_id, query::QueryParams, ApiError, ApiResponse, AppState,
};

/// Query parameters for `GET /api/v1/products`. All values are kept raw and
/// parsed leniently: anything unusable means "no filter".
#[derive(Debug, Default)]
pub(super) struct ProductQuery {
    pub category: Option<String>,
    pub category_id: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub slug: Option<String>,
    pub is_featured: Option<String>,
    pub search: Option<String>,
    pub include_inactive: Option<String>,
    pub limit: Option<String>,
}

impl ProductQuery {
    fn from_params(params: &QueryParams) -> Self {
        let raw = |name: &str| params.get(name).map(ToOwned::to_owned);
        Self {
            category: params
                .get_any(&["category", "category__slug"])
                .map(ToOwned::to_owned),
            category_id: raw("category_id"),
            min_price: raw("min_price"),
            max_price: raw("max_price"),
            slug: raw("slug"),
            is_featured: raw("is_featured"),
            search: raw("search"),
            include_inactive: raw("include_inactive"),
            limit: raw("limit"),
        }
    }

    fn into_filter(self, caller: Caller) -> ProductFilter {
        let text = |raw: Option<String>| raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        ProductFilter {
            category_slug: text(self.category),
            category_id: lenient(self.category_id.as_deref()),
            slug: text(self.slug),
            is_featured: lenient_bool(self.is_featured.as_deref()),
            search: text(self.search),
            price: PriceBounds {
                min: self.min_price.as_deref().and_then(parse_price),
                max: self.max_price.as_deref().and_then(parse_price),
            },
            include_inactive: caller.is_admin()
                && lenient_bool(self.include_inactive.as_deref()) == Some(true),
            limit: normalize_limit(lenient(self.limit.as_deref())),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ViewRecorded {
    status: &'static str,
    total: i64,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    params: QueryParams,
) -> Result<Json<ApiResponse<Vec<ProductDetail>>>, ApiError> {
    let filter = ProductQuery::from_params(&params).into_filter(caller);
    let rows = vitrine_db::list_products(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// GET /api/v1/products/{id}: counts a view, then returns the product.
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let include_inactive = caller.is_admin();

    vitrine_db::increment_views(&state.pool, id, include_inactive)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    let detail = vitrine_db::get_product(&state.pool, id, include_inactive)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    Ok(Json(ApiResponse::new(detail, req_id.0)))
}

/// GET /api/v1/products/slug/{slug}: counts a view, then returns the product.
pub(super) async fn get_product_by_slug(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;
    let include_inactive = caller.is_admin();

    let (id, _) = vitrine_db::increment_views_by_slug(&state.pool, &slug, include_inactive)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    let detail = vitrine_db::get_product(&state.pool, id, include_inactive)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    Ok(Json(ApiResponse::new(detail, req_id.0)))
}

/// POST /api/v1/products/{id}/increment-view
pub(super) async fn increment_view(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ViewRecorded>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;

    let total = vitrine_db::increment_views(&state.pool, id, false)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    Ok(Json(ApiResponse::new(
        ViewRecorded {
            status: "view recorded",
            total,
        },
        req_id.0,
    )))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/v1/products: multipart, urlencoded or JSON body.
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    WriteForm(fields): WriteForm,
) -> Result<(StatusCode, Json<ApiResponse<ProductDetail>>), ApiError> {
    let rid = &req_id.0;
    let input = ProductInput::from_fields(&fields).map_err(|e| map_payload_error(rid, &e))?;
    let (name, category_id) = input
        .required_for_create()
        .map_err(|e| map_payload_error(rid, &e))?;

    let detail = vitrine_db::create_product(&state.pool, name, category_id, &input)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(detail, req_id.0))))
}

/// PATCH /api/v1/products/{id}: only the fields sent are changed.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    WriteForm(fields): WriteForm,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let input = ProductInput::from_fields(&fields).map_err(|e| map_payload_error(rid, &e))?;

    let detail = vitrine_db::update_product(&state.pool, id, &input)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(detail, req_id.0)))
}

/// DELETE /api/v1/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &id)?;
    let deleted = vitrine_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(rid))
    }
}

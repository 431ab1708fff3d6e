mod banners;
mod categories;
mod company;
mod coupons;
mod dashboard;
mod exit_popups;
mod finishings;
mod form;
mod kits;
mod products;
mod query;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vitrine_core::PayloadError;

use crate::middleware::{
    enforce_rate_limit, request_id, require_write_auth, AuthState, Caller, RateLimitState,
    RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Shared handler helpers
// ---------------------------------------------------------------------------

/// Clamp an optional `?limit=` to `1..=200`; absent stays absent.
pub(super) fn normalize_limit(limit: Option<i64>) -> Option<i64> {
    limit.map(|l| l.clamp(1, 200))
}

/// Parse an optional query parameter, treating blank or unparsable values
/// as absent.
pub(super) fn lenient<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Lenient boolean: accepts `true/false`, `1/0`, `yes/no`, `on/off`.
pub(super) fn lenient_bool(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Numeric path ids; anything else cannot name a record.
pub(super) fn parse_id(request_id: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| not_found(request_id))
}

pub(super) fn not_found(request_id: &str) -> ApiError {
    ApiError::new(request_id, "not_found", "record not found")
}

pub(super) fn require_admin(request_id: &str, caller: Caller) -> Result<(), ApiError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(ApiError::new(
            request_id,
            "unauthorized",
            "missing or invalid bearer token",
        ))
    }
}

/// Deserialize a PATCH field so that a missing key stays `None` and an
/// explicit `null` becomes `Some(None)`. Use with `#[serde(default)]`.
#[allow(clippy::option_option)]
pub(super) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(super) fn map_payload_error(request_id: &str, error: &PayloadError) -> ApiError {
    let code = match error {
        PayloadError::NotAnObject => "bad_request",
        PayloadError::Missing { .. } | PayloadError::Invalid { .. } => "validation_error",
    };
    ApiError::new(request_id, code, error.to_string())
}

pub(super) fn validation_error(request_id: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(request_id, "validation_error", message)
}

/// Map a storage error to an API error. Constraint violations are the
/// caller's fault; anything else is logged and hidden.
pub(super) fn map_db_error(request_id: String, error: &vitrine_db::DbError) -> ApiError {
    if matches!(error, vitrine_db::DbError::NotFound) {
        return not_found(&request_id);
    }
    if error.is_unique_violation() {
        return ApiError::new(request_id, "conflict", "a record with that value already exists");
    }
    if error.is_foreign_key_violation() {
        return ApiError::new(
            request_id,
            "validation_error",
            "referenced record does not exist",
        );
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

/// Routes open to everyone regardless of method.
fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/products/{id}/increment-view",
            post(products::increment_view),
        )
}

/// Catalog routes: reads are public, writes and admin reads need a key.
fn catalog_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/v1/categories/{id}",
            get(categories::get_category)
                .patch(categories::update_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/v1/finishings",
            get(finishings::list_finishings).post(finishings::create_finishing),
        )
        .route(
            "/api/v1/finishings/{id}",
            get(finishings::get_finishing)
                .patch(finishings::update_finishing)
                .put(finishings::update_finishing)
                .delete(finishings::delete_finishing),
        )
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/products/slug/{slug}",
            get(products::get_product_by_slug),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/v1/kits", get(kits::list_kits).post(kits::create_kit))
        .route("/api/v1/kits/slug/{slug}", get(kits::get_kit_by_slug))
        .route(
            "/api/v1/kits/{id}",
            get(kits::get_kit)
                .patch(kits::update_kit)
                .put(kits::update_kit)
                .delete(kits::delete_kit),
        )
        .route(
            "/api/v1/banners",
            get(banners::list_banners).post(banners::create_banner),
        )
        .route(
            "/api/v1/banners/{id}",
            axum::routing::patch(banners::update_banner).delete(banners::delete_banner),
        )
        .route(
            "/api/v1/company",
            get(company::get_company).put(company::put_company),
        )
        .route(
            "/api/v1/coupons",
            get(coupons::list_coupons).post(coupons::create_coupon),
        )
        .route("/api/v1/coupons/validate", get(coupons::validate_coupon))
        .route(
            "/api/v1/coupons/{id}",
            axum::routing::patch(coupons::update_coupon).delete(coupons::delete_coupon),
        )
        .route("/api/v1/exit-popup", get(exit_popups::current_exit_popup))
        .route(
            "/api/v1/exit-popup/configs",
            get(exit_popups::list_exit_popups).post(exit_popups::create_exit_popup),
        )
        .route(
            "/api/v1/exit-popup/configs/{id}",
            axum::routing::patch(exit_popups::update_exit_popup)
                .delete(exit_popups::delete_exit_popup),
        )
        .route("/api/v1/dashboard/stats", get(dashboard::get_stats))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_write_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .merge(public_router())
        .merge(catalog_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match vitrine_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use axum::{extract::State, Extension, Json};
use vitrine_db::{CatalogStats, DEFAULT_RANKING_LIMIT};

use crate::middleware::{Caller, RequestId};

use super::{
    lenient, map_db_error, query::QueryParams, require_admin, ApiError, ApiResponse, AppState,
};

/// GET /api/v1/dashboard/stats: total catalog views and the most viewed
/// products. Admin only.
pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    params: QueryParams,
) -> Result<Json<ApiResponse<CatalogStats>>, ApiError> {
    require_admin(&req_id.0, caller)?;
    let limit = lenient(params.get("limit")).unwrap_or(DEFAULT_RANKING_LIMIT);

    let stats = vitrine_db::catalog_stats(&state.pool, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(stats, req_id.0)))
}

//! View-count aggregation for the admin dashboard.

use serde::Serialize;
use sqlx::PgPool;

use crate::{
    products::{load_product_details, ProductDetail, ProductRow, PRODUCT_SELECT},
    DbError,
};

pub const DEFAULT_RANKING_LIMIT: i64 = 10;
pub const MAX_RANKING_LIMIT: i64 = 50;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_catalog_views: i64,
    pub ranking: Vec<ProductDetail>,
}

/// Sums `views_count` over every product, active or not, and ranks the top
/// `limit` products by views (ties by id). `limit` is clamped to
/// `1..=MAX_RANKING_LIMIT`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn catalog_stats(pool: &PgPool, limit: i64) -> Result<CatalogStats, DbError> {
    let limit = limit.clamp(1, MAX_RANKING_LIMIT);

    let total_catalog_views = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(views_count), 0)::BIGINT FROM products",
    )
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} ORDER BY p.views_count DESC, p.id ASC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(CatalogStats {
        total_catalog_views,
        ranking: load_product_details(pool, rows).await?,
    })
}

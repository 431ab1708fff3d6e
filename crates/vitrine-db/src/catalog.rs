//! Filtered product listing.

use sqlx::PgPool;
use vitrine_core::PriceBounds;

use crate::{
    like_pattern,
    products::{load_product_details, ProductDetail, ProductRow, PRODUCT_SELECT},
    DbError,
};

/// Constraints for [`list_products`]. Every `None` field means "no filter".
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_slug: Option<String>,
    pub category_id: Option<i64>,
    pub slug: Option<String>,
    pub is_featured: Option<bool>,
    pub search: Option<String>,
    pub price: PriceBounds,
    pub include_inactive: bool,
    pub limit: Option<i64>,
}

/// Lists products matching `filter`, ordered by id ascending.
///
/// The price bounds are two independent existence tests: a product passes
/// when some variant costs at least `min` and some (possibly different)
/// variant costs at most `max`. Products without variants never pass a
/// price bound.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_products(
    pool: &PgPool,
    filter: &ProductFilter,
) -> Result<Vec<ProductDetail>, DbError> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} \
         WHERE ($1::BOOL OR p.is_active) \
           AND ($2::TEXT IS NULL OR c.slug = $2) \
           AND ($3::BIGINT IS NULL OR p.category_id = $3) \
           AND ($4::TEXT IS NULL OR p.slug = $4) \
           AND ($5::BOOL IS NULL OR p.is_featured = $5) \
           AND ($6::TEXT IS NULL OR p.name ILIKE $6 OR p.description ILIKE $6) \
           AND ($7::NUMERIC IS NULL OR EXISTS ( \
                 SELECT 1 FROM product_variants v WHERE v.product_id = p.id AND v.price >= $7)) \
           AND ($8::NUMERIC IS NULL OR EXISTS ( \
                 SELECT 1 FROM product_variants v WHERE v.product_id = p.id AND v.price <= $8)) \
         ORDER BY p.id \
         LIMIT $9"
    ))
    .bind(filter.include_inactive)
    .bind(filter.category_slug.as_deref())
    .bind(filter.category_id)
    .bind(filter.slug.as_deref())
    .bind(filter.is_featured)
    .bind(search)
    .bind(filter.price.min)
    .bind(filter.price.max)
    .bind(filter.limit)
    .fetch_all(pool)
    .await?;

    load_product_details(pool, rows).await
}


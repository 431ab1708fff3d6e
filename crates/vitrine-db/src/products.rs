//! Database operations for the `products` table and its detail view.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use vitrine_core::{ProductInput, SlugScope};

use crate::{relations::sync_product_relations, slugs::assign_unique_slug, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A product joined with its category's name and slug.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    #[serde(rename = "category")]
    pub category_id: i64,
    pub category_name: String,
    pub category_slug: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: String,
    pub production_time: String,
    pub is_active: bool,
    pub views_count: i64,
    pub is_featured: bool,
    pub is_per_unit_price: bool,
    pub is_on_sale: bool,
    pub discount_percent: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VariantRow {
    #[serde(skip)]
    pub product_id: i64,
    pub id: i64,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FinishingRef {
    #[serde(skip)]
    pub product_id: i64,
    pub id: i64,
    pub name: String,
}

/// Compact view of a recommended product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UpsellRow {
    #[serde(skip)]
    pub product_id: i64,
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub min_price: Option<Decimal>,
}

/// A product with its variants, finishings and upsell targets.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductRow,
    pub variants: Vec<VariantRow>,
    pub finishings: Vec<FinishingRef>,
    pub upsells: Vec<UpsellRow>,
}

pub(crate) const PRODUCT_SELECT: &str = "SELECT p.id, p.category_id, c.name AS category_name, \
            c.slug AS category_slug, p.name, p.slug, p.description, p.image, \
            p.production_time, p.is_active, p.views_count, p.is_featured, \
            p.is_per_unit_price, p.is_on_sale, p.discount_percent, p.created_at, p.updated_at \
     FROM products p \
     JOIN categories c ON c.id = p.category_id";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Attaches variants, finishings and upsells to `rows`, preserving order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn load_product_details(
    pool: &PgPool,
    rows: Vec<ProductRow>,
) -> Result<Vec<ProductDetail>, DbError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let variants = sqlx::query_as::<_, VariantRow>(
        "SELECT product_id, id, name, price FROM product_variants \
         WHERE product_id = ANY($1) \
         ORDER BY product_id, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let finishings = sqlx::query_as::<_, FinishingRef>(
        "SELECT pf.product_id, f.id, f.name \
         FROM product_finishings pf \
         JOIN finishings f ON f.id = pf.finishing_id \
         WHERE pf.product_id = ANY($1) \
         ORDER BY pf.product_id, f.id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let upsells = sqlx::query_as::<_, UpsellRow>(
        "SELECT pu.product_id, p.id, p.name, p.slug, p.image, \
                (SELECT MIN(v.price) FROM product_variants v WHERE v.product_id = p.id) AS min_price \
         FROM product_upsells pu \
         JOIN products p ON p.id = pu.upsell_product_id \
         WHERE pu.product_id = ANY($1) \
         ORDER BY pu.product_id, p.id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut variants_by = group_by(variants, |v| v.product_id);
    let mut finishings_by = group_by(finishings, |f| f.product_id);
    let mut upsells_by = group_by(upsells, |u| u.product_id);

    Ok(rows
        .into_iter()
        .map(|product| ProductDetail {
            variants: variants_by.remove(&product.id).unwrap_or_default(),
            finishings: finishings_by.remove(&product.id).unwrap_or_default(),
            upsells: upsells_by.remove(&product.id).unwrap_or_default(),
            product,
        })
        .collect())
}

fn group_by<T>(items: Vec<T>, key: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}

async fn single_detail(pool: &PgPool, row: Option<ProductRow>) -> Result<Option<ProductDetail>, DbError> {
    let Some(row) = row else {
        return Ok(None);
    };
    Ok(load_product_details(pool, vec![row]).await?.pop())
}

/// Fetches one product with its relations. Inactive products are hidden
/// unless `include_inactive` is set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_product(
    pool: &PgPool,
    id: i64,
    include_inactive: bool,
) -> Result<Option<ProductDetail>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE p.id = $1 AND ($2::BOOL OR p.is_active)"
    ))
    .bind(id)
    .bind(include_inactive)
    .fetch_optional(pool)
    .await?;
    single_detail(pool, row).await
}

/// Same as [`get_product`] but looked up by slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_product_by_slug(
    pool: &PgPool,
    slug: &str,
    include_inactive: bool,
) -> Result<Option<ProductDetail>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE p.slug = $1 AND ($2::BOOL OR p.is_active)"
    ))
    .bind(slug)
    .bind(include_inactive)
    .fetch_optional(pool)
    .await?;
    single_detail(pool, row).await
}

// ---------------------------------------------------------------------------
// View counter
// ---------------------------------------------------------------------------

/// Adds one view to a product and returns the new total, or `None` if the
/// product does not exist (or is inactive and `include_inactive` is unset).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn increment_views(
    pool: &PgPool,
    id: i64,
    include_inactive: bool,
) -> Result<Option<i64>, DbError> {
    let total = sqlx::query_scalar::<_, i64>(
        "UPDATE products SET views_count = views_count + 1 \
         WHERE id = $1 AND ($2::BOOL OR is_active) \
         RETURNING views_count",
    )
    .bind(id)
    .bind(include_inactive)
    .fetch_optional(pool)
    .await?;
    Ok(total)
}

/// Slug form of [`increment_views`]. Returns `(product_id, views_count)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn increment_views_by_slug(
    pool: &PgPool,
    slug: &str,
    include_inactive: bool,
) -> Result<Option<(i64, i64)>, DbError> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        "UPDATE products SET views_count = views_count + 1 \
         WHERE slug = $1 AND ($2::BOOL OR is_active) \
         RETURNING id, views_count",
    )
    .bind(slug)
    .bind(include_inactive)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a product and applies its child batches in one transaction.
///
/// `name` and `category_id` are the required fields of `input`, already
/// extracted by the caller. Without an explicit slug, one is derived from
/// `name`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails. An unknown category is a
/// foreign-key violation; an explicit slug already in use is a unique
/// violation.
pub async fn create_product(
    pool: &PgPool,
    name: &str,
    category_id: i64,
    input: &ProductInput,
) -> Result<ProductDetail, DbError> {
    let mut tx = pool.begin().await?;

    let slug = match input.slug.as_deref() {
        Some(s) => s.to_string(),
        None => assign_unique_slug(&mut tx, SlugScope::Product, name).await?,
    };

    let product_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
           (category_id, name, slug, description, image, production_time, is_active, \
            is_featured, is_per_unit_price, is_on_sale, discount_percent) \
         VALUES ($1, $2, $3, $4, COALESCE($5, ''), COALESCE($6, ''), COALESCE($7, TRUE), \
                 COALESCE($8, FALSE), COALESCE($9, FALSE), COALESCE($10, FALSE), COALESCE($11, 0)) \
         RETURNING id",
    )
    .bind(category_id)
    .bind(name)
    .bind(&slug)
    .bind(input.description.clone().flatten())
    .bind(input.image.as_deref())
    .bind(input.production_time.as_deref())
    .bind(input.is_active)
    .bind(input.is_featured)
    .bind(input.is_per_unit_price)
    .bind(input.is_on_sale)
    .bind(input.discount_percent)
    .fetch_one(&mut *tx)
    .await?;

    let report = sync_product_relations(&mut tx, product_id, input).await?;
    tx.commit().await?;

    tracing::info!(product_id, %slug, ?report, "product created");

    get_product(pool, product_id, true)
        .await?
        .ok_or(DbError::NotFound)
}

/// Partially updates a product and applies any supplied child batches in
/// one transaction. The slug is only changed by an explicit `slug` field.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if a statement fails.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    input: &ProductInput,
) -> Result<ProductDetail, DbError> {
    let description_supplied = input.description.is_some();
    let description_val = input.description.clone().flatten();

    let mut tx = pool.begin().await?;

    let updated = sqlx::query_scalar::<_, i64>(
        "UPDATE products \
         SET name              = COALESCE($2, name), \
             slug              = COALESCE($3, slug), \
             description       = CASE WHEN $4::BOOL THEN $5 ELSE description END, \
             image             = COALESCE($6, image), \
             production_time   = COALESCE($7, production_time), \
             category_id       = COALESCE($8, category_id), \
             is_active         = COALESCE($9, is_active), \
             is_featured       = COALESCE($10, is_featured), \
             is_per_unit_price = COALESCE($11, is_per_unit_price), \
             is_on_sale        = COALESCE($12, is_on_sale), \
             discount_percent  = COALESCE($13, discount_percent), \
             updated_at        = NOW() \
         WHERE id = $1 \
         RETURNING id",
    )
    .bind(id)
    .bind(input.name.as_deref())
    .bind(input.slug.as_deref())
    .bind(description_supplied)
    .bind(description_val)
    .bind(input.image.as_deref())
    .bind(input.production_time.as_deref())
    .bind(input.category_id)
    .bind(input.is_active)
    .bind(input.is_featured)
    .bind(input.is_per_unit_price)
    .bind(input.is_on_sale)
    .bind(input.discount_percent)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(product_id) = updated else {
        return Err(DbError::NotFound);
    };

    let report = sync_product_relations(&mut tx, product_id, input).await?;
    tx.commit().await?;

    tracing::debug!(product_id, ?report, "product updated");

    get_product(pool, product_id, true)
        .await?
        .ok_or(DbError::NotFound)
}

/// Deletes a product together with its variants and relation rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

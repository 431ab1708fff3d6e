//! Database operations for the `kits` table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use vitrine_core::{KitInput, SlugScope};

use crate::{like_pattern, relations::sync_kit_relations, slugs::assign_unique_slug, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct KitRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: String,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product bundled in a kit, with its cheapest variant price.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct KitProductRow {
    #[serde(skip)]
    pub kit_id: i64,
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub min_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KitDetail {
    #[serde(flatten)]
    pub kit: KitRow,
    pub products: Vec<i64>,
    pub products_details: Vec<KitProductRow>,
}

#[derive(Debug, Clone, Default)]
pub struct KitFilter {
    pub search: Option<String>,
    pub include_inactive: bool,
}

const KIT_COLUMNS: &str =
    "id, name, slug, description, image, price, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Attaches member products to `kits`, preserving order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_kit_details(pool: &PgPool, kits: Vec<KitRow>) -> Result<Vec<KitDetail>, DbError> {
    if kits.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = kits.iter().map(|k| k.id).collect();

    let members = sqlx::query_as::<_, KitProductRow>(
        "SELECT kp.kit_id, p.id, p.name, p.slug, p.image, \
                (SELECT MIN(v.price) FROM product_variants v WHERE v.product_id = p.id) AS min_price \
         FROM kit_products kp \
         JOIN products p ON p.id = kp.product_id \
         WHERE kp.kit_id = ANY($1) \
         ORDER BY kp.kit_id, p.id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_kit: HashMap<i64, Vec<KitProductRow>> = HashMap::new();
    for member in members {
        by_kit.entry(member.kit_id).or_default().push(member);
    }

    Ok(kits
        .into_iter()
        .map(|kit| {
            let products_details = by_kit.remove(&kit.id).unwrap_or_default();
            KitDetail {
                products: products_details.iter().map(|p| p.id).collect(),
                products_details,
                kit,
            }
        })
        .collect())
}

/// Lists kits ordered by id. Public callers see active kits only.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_kits(pool: &PgPool, filter: &KitFilter) -> Result<Vec<KitDetail>, DbError> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let rows = sqlx::query_as::<_, KitRow>(&format!(
        "SELECT {KIT_COLUMNS} FROM kits \
         WHERE ($1::BOOL OR is_active) \
           AND ($2::TEXT IS NULL OR name ILIKE $2 OR description ILIKE $2) \
         ORDER BY id"
    ))
    .bind(filter.include_inactive)
    .bind(search)
    .fetch_all(pool)
    .await?;

    load_kit_details(pool, rows).await
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_kit(
    pool: &PgPool,
    id: i64,
    include_inactive: bool,
) -> Result<Option<KitDetail>, DbError> {
    let row = sqlx::query_as::<_, KitRow>(&format!(
        "SELECT {KIT_COLUMNS} FROM kits WHERE id = $1 AND ($2::BOOL OR is_active)"
    ))
    .bind(id)
    .bind(include_inactive)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(load_kit_details(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_kit_by_slug(
    pool: &PgPool,
    slug: &str,
    include_inactive: bool,
) -> Result<Option<KitDetail>, DbError> {
    let row = sqlx::query_as::<_, KitRow>(&format!(
        "SELECT {KIT_COLUMNS} FROM kits WHERE slug = $1 AND ($2::BOOL OR is_active)"
    ))
    .bind(slug)
    .bind(include_inactive)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(load_kit_details(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a kit and its member products in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn create_kit(
    pool: &PgPool,
    name: &str,
    price: Decimal,
    input: &KitInput,
) -> Result<KitDetail, DbError> {
    let mut tx = pool.begin().await?;

    let slug = match input.slug.as_deref() {
        Some(s) => s.to_string(),
        None => assign_unique_slug(&mut tx, SlugScope::Kit, name).await?,
    };

    let kit_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO kits (name, slug, description, image, price, is_active) \
         VALUES ($1, $2, $3, COALESCE($4, ''), $5, COALESCE($6, TRUE)) \
         RETURNING id",
    )
    .bind(name)
    .bind(&slug)
    .bind(input.description.clone().flatten())
    .bind(input.image.as_deref())
    .bind(price)
    .bind(input.is_active)
    .fetch_one(&mut *tx)
    .await?;

    sync_kit_relations(&mut tx, kit_id, input).await?;
    tx.commit().await?;

    tracing::info!(kit_id, %slug, "kit created");

    get_kit(pool, kit_id, true).await?.ok_or(DbError::NotFound)
}

/// Partially updates a kit; a supplied product batch replaces the members.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no kit has `id`, or [`DbError::Sqlx`]
/// if a statement fails.
pub async fn update_kit(pool: &PgPool, id: i64, input: &KitInput) -> Result<KitDetail, DbError> {
    let description_supplied = input.description.is_some();
    let description_val = input.description.clone().flatten();

    let mut tx = pool.begin().await?;

    let updated = sqlx::query_scalar::<_, i64>(
        "UPDATE kits \
         SET name        = COALESCE($2, name), \
             slug        = COALESCE($3, slug), \
             description = CASE WHEN $4::BOOL THEN $5 ELSE description END, \
             image       = COALESCE($6, image), \
             price       = COALESCE($7, price), \
             is_active   = COALESCE($8, is_active), \
             updated_at  = NOW() \
         WHERE id = $1 \
         RETURNING id",
    )
    .bind(id)
    .bind(input.name.as_deref())
    .bind(input.slug.as_deref())
    .bind(description_supplied)
    .bind(description_val)
    .bind(input.image.as_deref())
    .bind(input.price)
    .bind(input.is_active)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(kit_id) = updated else {
        return Err(DbError::NotFound);
    };

    sync_kit_relations(&mut tx, kit_id, input).await?;
    tx.commit().await?;

    get_kit(pool, kit_id, true).await?.ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_kit(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM kits WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

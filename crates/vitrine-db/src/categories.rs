//! Database operations for the `categories` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use vitrine_core::SlugScope;

use crate::{slugs::assign_unique_slug, DbError};

/// A category together with the number of products filed under it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub products_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const CATEGORY_COLUMNS: &str = "c.id, c.name, c.slug, c.icon, \
     (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS products_count, \
     c.created_at, c.updated_at";

/// Returns every category ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories c ORDER BY c.name, c.id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Inserts a category. Without an explicit `slug`, one is derived from
/// `name` and suffixed until unique.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; an explicit slug that is
/// already taken is a unique violation.
pub async fn create_category(
    pool: &PgPool,
    name: &str,
    slug: Option<&str>,
    icon: Option<&str>,
) -> Result<CategoryRow, DbError> {
    let mut tx = pool.begin().await?;

    let slug = match slug {
        Some(s) => s.to_string(),
        None => assign_unique_slug(&mut tx, SlugScope::Category, name).await?,
    };

    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "WITH c AS ( \
             INSERT INTO categories (name, slug, icon) VALUES ($1, $2, $3) RETURNING * \
         ) \
         SELECT {CATEGORY_COLUMNS} FROM c"
    ))
    .bind(name)
    .bind(&slug)
    .bind(icon)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Partially updates a category. The slug changes only when `slug` is given.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no category has `id`, or
/// [`DbError::Sqlx`] if the update fails.
#[allow(clippy::option_option)]
pub async fn update_category(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    slug: Option<&str>,
    icon: Option<Option<&str>>,
) -> Result<CategoryRow, DbError> {
    let icon_supplied = icon.is_some();
    let icon_val = icon.flatten();

    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "WITH c AS ( \
             UPDATE categories \
             SET name       = COALESCE($2, name), \
                 slug       = COALESCE($3, slug), \
                 icon       = CASE WHEN $4::BOOL THEN $5 ELSE icon END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING * \
         ) \
         SELECT {CATEGORY_COLUMNS} FROM c"
    ))
    .bind(id)
    .bind(name)
    .bind(slug)
    .bind(icon_supplied)
    .bind(icon_val)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a category and, by cascade, its products.
///
/// Returns `false` if no category had `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_category(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

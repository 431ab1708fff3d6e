//! Database operations for the `banners` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BannerRow {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub image_mobile: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Banner fields for create and partial update. `None` keeps the current
/// value (or the column default on create).
// image_mobile: outer None = not sent, Some(None) = cleared.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct BannerWrite {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    pub image_mobile: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

const BANNER_COLUMNS: &str =
    "id, title, subtitle, image, image_mobile, is_active, sort_order, created_at";

/// Lists banners by `sort_order`, then id. Inactive banners are skipped
/// unless `include_inactive` is set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_banners(pool: &PgPool, include_inactive: bool) -> Result<Vec<BannerRow>, DbError> {
    let rows = sqlx::query_as::<_, BannerRow>(&format!(
        "SELECT {BANNER_COLUMNS} FROM banners \
         WHERE ($1::BOOL OR is_active) \
         ORDER BY sort_order, id"
    ))
    .bind(include_inactive)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (a missing `image` is a
/// not-null violation; callers validate it first).
pub async fn create_banner(pool: &PgPool, banner: &BannerWrite) -> Result<BannerRow, DbError> {
    let row = sqlx::query_as::<_, BannerRow>(&format!(
        "INSERT INTO banners (title, subtitle, image, image_mobile, is_active, sort_order) \
         VALUES (COALESCE($1, ''), COALESCE($2, ''), $3, $4, COALESCE($5, TRUE), COALESCE($6, 0)) \
         RETURNING {BANNER_COLUMNS}"
    ))
    .bind(banner.title.as_deref())
    .bind(banner.subtitle.as_deref())
    .bind(banner.image.as_deref())
    .bind(banner.image_mobile.clone().flatten())
    .bind(banner.is_active)
    .bind(banner.sort_order)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no banner has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_banner(
    pool: &PgPool,
    id: i64,
    banner: &BannerWrite,
) -> Result<BannerRow, DbError> {
    let mobile_supplied = banner.image_mobile.is_some();
    let mobile_val = banner.image_mobile.clone().flatten();

    let row = sqlx::query_as::<_, BannerRow>(&format!(
        "UPDATE banners \
         SET title        = COALESCE($2, title), \
             subtitle     = COALESCE($3, subtitle), \
             image        = COALESCE($4, image), \
             image_mobile = CASE WHEN $5::BOOL THEN $6 ELSE image_mobile END, \
             is_active    = COALESCE($7, is_active), \
             sort_order   = COALESCE($8, sort_order) \
         WHERE id = $1 \
         RETURNING {BANNER_COLUMNS}"
    ))
    .bind(id)
    .bind(banner.title.as_deref())
    .bind(banner.subtitle.as_deref())
    .bind(banner.image.as_deref())
    .bind(mobile_supplied)
    .bind(mobile_val)
    .bind(banner.is_active)
    .bind(banner.sort_order)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_banner(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM banners WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

//! Database operations for the `coupons` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CouponRow {
    pub id: i64,
    pub code: String,
    pub discount_percentage: i16,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const COUPON_COLUMNS: &str = "id, code, discount_percentage, is_active, created_at";

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_coupons(pool: &PgPool) -> Result<Vec<CouponRow>, DbError> {
    let rows = sqlx::query_as::<_, CouponRow>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Looks up an active coupon by code, ignoring case.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_active_coupon(pool: &PgPool, code: &str) -> Result<Option<CouponRow>, DbError> {
    let row = sqlx::query_as::<_, CouponRow>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupons \
         WHERE lower(code) = lower($1) AND is_active"
    ))
    .bind(code.trim())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a code that differs from
/// an existing one only by case is a unique violation.
pub async fn create_coupon(
    pool: &PgPool,
    code: &str,
    discount_percentage: i16,
    is_active: Option<bool>,
) -> Result<CouponRow, DbError> {
    let row = sqlx::query_as::<_, CouponRow>(&format!(
        "INSERT INTO coupons (code, discount_percentage, is_active) \
         VALUES ($1, $2, COALESCE($3, TRUE)) \
         RETURNING {COUPON_COLUMNS}"
    ))
    .bind(code)
    .bind(discount_percentage)
    .bind(is_active)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no coupon has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_coupon(
    pool: &PgPool,
    id: i64,
    code: Option<&str>,
    discount_percentage: Option<i16>,
    is_active: Option<bool>,
) -> Result<CouponRow, DbError> {
    let row = sqlx::query_as::<_, CouponRow>(&format!(
        "UPDATE coupons \
         SET code                = COALESCE($2, code), \
             discount_percentage = COALESCE($3, discount_percentage), \
             is_active           = COALESCE($4, is_active) \
         WHERE id = $1 \
         RETURNING {COUPON_COLUMNS}"
    ))
    .bind(id)
    .bind(code)
    .bind(discount_percentage)
    .bind(is_active)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_coupon(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

//! Exit-intent popup configurations. At most one row is active; activating
//! a row deactivates the previous one in the same transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExitPopupRow {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub message: String,
    pub coupon_code: String,
    pub minimum_cart_value: Decimal,
    pub timer_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Popup fields for create and partial update.
#[derive(Debug, Clone, Default)]
pub struct ExitPopupWrite {
    pub name: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub coupon_code: Option<String>,
    pub minimum_cart_value: Option<Decimal>,
    pub timer_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

const POPUP_COLUMNS: &str = "id, name, title, message, coupon_code, minimum_cart_value, \
     timer_minutes, is_active, created_at, updated_at";

async fn deactivate_others(conn: &mut PgConnection, keep_id: Option<i64>) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE exit_popup_configs SET is_active = FALSE, updated_at = NOW() \
         WHERE is_active AND ($1::BIGINT IS NULL OR id <> $1)",
    )
    .bind(keep_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_exit_popups(pool: &PgPool) -> Result<Vec<ExitPopupRow>, DbError> {
    let rows = sqlx::query_as::<_, ExitPopupRow>(&format!(
        "SELECT {POPUP_COLUMNS} FROM exit_popup_configs ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns the active popup, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn current_exit_popup(pool: &PgPool) -> Result<Option<ExitPopupRow>, DbError> {
    let row = sqlx::query_as::<_, ExitPopupRow>(&format!(
        "SELECT {POPUP_COLUMNS} FROM exit_popup_configs WHERE is_active"
    ))
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Inserts a popup. Requires `name` and `coupon_code`; an active popup
/// replaces the currently active one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn create_exit_popup(
    pool: &PgPool,
    popup: &ExitPopupWrite,
) -> Result<ExitPopupRow, DbError> {
    let mut tx = pool.begin().await?;

    if popup.is_active == Some(true) {
        deactivate_others(&mut tx, None).await?;
    }

    let row = sqlx::query_as::<_, ExitPopupRow>(&format!(
        "INSERT INTO exit_popup_configs \
           (name, title, message, coupon_code, minimum_cart_value, timer_minutes, is_active) \
         VALUES ($1, COALESCE($2, ''), COALESCE($3, ''), $4, COALESCE($5, 0), \
                 COALESCE($6, 15), COALESCE($7, FALSE)) \
         RETURNING {POPUP_COLUMNS}"
    ))
    .bind(popup.name.as_deref())
    .bind(popup.title.as_deref())
    .bind(popup.message.as_deref())
    .bind(popup.coupon_code.as_deref())
    .bind(popup.minimum_cart_value)
    .bind(popup.timer_minutes)
    .bind(popup.is_active)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no popup has `id`, or [`DbError::Sqlx`]
/// if a statement fails.
pub async fn update_exit_popup(
    pool: &PgPool,
    id: i64,
    popup: &ExitPopupWrite,
) -> Result<ExitPopupRow, DbError> {
    let mut tx = pool.begin().await?;

    if popup.is_active == Some(true) {
        deactivate_others(&mut tx, Some(id)).await?;
    }

    let row = sqlx::query_as::<_, ExitPopupRow>(&format!(
        "UPDATE exit_popup_configs \
         SET name               = COALESCE($2, name), \
             title              = COALESCE($3, title), \
             message            = COALESCE($4, message), \
             coupon_code        = COALESCE($5, coupon_code), \
             minimum_cart_value = COALESCE($6, minimum_cart_value), \
             timer_minutes      = COALESCE($7, timer_minutes), \
             is_active          = COALESCE($8, is_active), \
             updated_at         = NOW() \
         WHERE id = $1 \
         RETURNING {POPUP_COLUMNS}"
    ))
    .bind(id)
    .bind(popup.name.as_deref())
    .bind(popup.title.as_deref())
    .bind(popup.message.as_deref())
    .bind(popup.coupon_code.as_deref())
    .bind(popup.minimum_cart_value)
    .bind(popup.timer_minutes)
    .bind(popup.is_active)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Err(DbError::NotFound);
    };
    tx.commit().await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_exit_popup(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM exit_popup_configs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

//! Database operations for the `finishings` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FinishingRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_finishings(pool: &PgPool) -> Result<Vec<FinishingRow>, DbError> {
    let rows = sqlx::query_as::<_, FinishingRow>(
        "SELECT id, name, created_at FROM finishings ORDER BY name, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_finishing(pool: &PgPool, id: i64) -> Result<Option<FinishingRow>, DbError> {
    let row = sqlx::query_as::<_, FinishingRow>(
        "SELECT id, name, created_at FROM finishings WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_finishing(pool: &PgPool, name: &str) -> Result<FinishingRow, DbError> {
    let row = sqlx::query_as::<_, FinishingRow>(
        "INSERT INTO finishings (name) VALUES ($1) RETURNING id, name, created_at",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no finishing has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_finishing(pool: &PgPool, id: i64, name: &str) -> Result<FinishingRow, DbError> {
    let row = sqlx::query_as::<_, FinishingRow>(
        "UPDATE finishings SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
    )
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Deletes a finishing; products that referenced it simply lose the link.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_finishing(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM finishings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

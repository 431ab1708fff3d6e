//! Storage-backed slug assignment.

use sqlx::PgConnection;
use vitrine_core::slug::{base_slug, nth_candidate, SlugScope};

use crate::DbError;

fn exists_sql(scope: SlugScope) -> &'static str {
    match scope {
        SlugScope::Category => "SELECT EXISTS (SELECT 1 FROM categories WHERE slug = $1)",
        SlugScope::Product => "SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1)",
        SlugScope::Kit => "SELECT EXISTS (SELECT 1 FROM kits WHERE slug = $1)",
    }
}

/// Returns `true` if `slug` is already used by a row of `scope`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn slug_exists(
    conn: &mut PgConnection,
    scope: SlugScope,
    slug: &str,
) -> Result<bool, DbError> {
    let taken = sqlx::query_scalar::<_, bool>(exists_sql(scope))
        .bind(slug)
        .fetch_one(conn)
        .await?;
    Ok(taken)
}

/// Derives a slug from `name` that no row of `scope` uses yet.
///
/// Tries the base slug first, then `base-1`, `base-2`, ... until a free
/// candidate turns up. The check and the later insert are not atomic; a
/// concurrent writer taking the same candidate surfaces as a unique
/// violation on insert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a lookup fails.
pub async fn assign_unique_slug(
    conn: &mut PgConnection,
    scope: SlugScope,
    name: &str,
) -> Result<String, DbError> {
    let base = base_slug(name, scope);
    let mut n = 0u64;
    loop {
        let candidate = nth_candidate(&base, n);
        if !slug_exists(&mut *conn, scope, &candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/vitrine-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &vitrine_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    fn pg_code(&self) -> Option<String> {
        match self {
            DbError::Sqlx(sqlx::Error::Database(db_err)) => db_err.code().map(|c| c.into_owned()),
            _ => None,
        }
    }

    /// `true` for Postgres `unique_violation` (23505).
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.pg_code().as_deref() == Some("23505")
    }

    /// `true` for Postgres `foreign_key_violation` (23503).
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        self.pg_code().as_deref() == Some("23503")
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DbError> {
    // The _sqlx_migrations table does not exist on a fresh database; treat
    // absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

/// Escape `%`, `_` and `\` so user text matches literally inside `ILIKE`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("flyer"), "%flyer%");
    }

    #[test]
    fn migration_failures_convert_into_db_error() {
        let err = DbError::from(sqlx::migrate::MigrateError::VersionMissing(7));
        assert!(matches!(err, DbError::Migration(_)));
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn non_database_errors_are_not_constraint_violations() {
        let err = DbError::NotFound;
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }
}

pub mod banners;
pub mod catalog;
pub mod categories;
pub mod company;
pub mod coupons;
pub mod exit_popups;
pub mod finishings;
pub mod kits;
pub mod products;
pub mod relations;
pub mod seed;
pub mod slugs;
pub mod stats;

pub use banners::{
    create_banner, delete_banner, list_banners, update_banner, BannerRow, BannerWrite,
};
pub use catalog::{list_products, ProductFilter};
pub use categories::{
    create_category, delete_category, get_category, list_categories, update_category,
    CategoryRow,
};
pub use company::{get_company_config, upsert_company_config, CompanyConfigRow, CompanyConfigWrite};
pub use coupons::{
    create_coupon, delete_coupon, find_active_coupon, list_coupons, update_coupon, CouponRow,
};
pub use exit_popups::{
    create_exit_popup, current_exit_popup, delete_exit_popup, list_exit_popups,
    update_exit_popup, ExitPopupRow, ExitPopupWrite,
};
pub use finishings::{
    create_finishing, delete_finishing, get_finishing, list_finishings, update_finishing,
    FinishingRow,
};
pub use kits::{
    create_kit, delete_kit, get_kit, get_kit_by_slug, list_kits, load_kit_details, update_kit,
    KitDetail, KitFilter, KitProductRow, KitRow,
};
pub use products::{
    create_product, delete_product, get_product, get_product_by_slug, increment_views,
    increment_views_by_slug, load_product_details, update_product, FinishingRef, ProductDetail,
    ProductRow, UpsellRow, VariantRow,
};
pub use relations::{
    replace_variants, set_finishings, set_kit_products, set_upsells, sync_kit_relations,
    sync_product_relations, SyncReport,
};
pub use seed::{seed_catalog, SeedSummary};
pub use slugs::{assign_unique_slug, slug_exists};
pub use stats::{catalog_stats, CatalogStats, DEFAULT_RANKING_LIMIT, MAX_RANKING_LIMIT};

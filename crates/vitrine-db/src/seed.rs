use sqlx::PgPool;
use vitrine_core::CatalogSeed;

use crate::{
    company::{upsert_company_config, CompanyConfigWrite},
    DbError,
};

/// Counts of records written by [`seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub finishings_inserted: usize,
    pub company_written: bool,
}

/// Upsert the seed catalog: categories by slug, finishings by name (only
/// missing ones are inserted) and the company singleton.
///
/// All writes run inside a single transaction; if any operation fails the
/// entire seed is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(pool: &PgPool, seed: &CatalogSeed) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for category in &seed.categories {
        sqlx::query(
            "INSERT INTO categories (name, slug, icon) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 icon = EXCLUDED.icon, \
                 updated_at = NOW()",
        )
        .bind(&category.name)
        .bind(category.slug())
        .bind(category.icon.as_deref())
        .execute(&mut *tx)
        .await?;
        summary.categories += 1;
    }

    for name in &seed.finishings {
        let result = sqlx::query(
            "INSERT INTO finishings (name) \
             SELECT $1 WHERE NOT EXISTS (SELECT 1 FROM finishings WHERE name = $1)",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() > 0 {
            summary.finishings_inserted += 1;
        }
    }

    if let Some(company) = &seed.company {
        upsert_company_config(&mut tx, &CompanyConfigWrite::from(company)).await?;
        summary.company_written = true;
    }

    tx.commit().await?;
    Ok(summary)
}

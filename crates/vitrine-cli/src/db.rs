//! Handlers for the `db` and `stats` commands.

use std::path::Path;

use anyhow::Context;
use sqlx::PgPool;

pub(crate) async fn run_ping(pool: &PgPool) -> anyhow::Result<()> {
    vitrine_db::ping(pool)
        .await
        .context("database ping failed")?;
    println!("database: ok");
    Ok(())
}

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = vitrine_db::run_migrations(pool)
        .await
        .context("failed to run migrations")?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

pub(crate) async fn run_seed(pool: &PgPool, seed_path: &Path) -> anyhow::Result<()> {
    let seed = vitrine_core::load_catalog_seed(seed_path)
        .with_context(|| format!("failed to load seed file {}", seed_path.display()))?;
    let summary = vitrine_db::seed_catalog(pool, &seed).await?;

    tracing::info!(
        categories = summary.categories,
        finishings_inserted = summary.finishings_inserted,
        company_written = summary.company_written,
        "seed complete"
    );
    println!(
        "seeded {} categories, {} new finishings{}",
        summary.categories,
        summary.finishings_inserted,
        if summary.company_written {
            ", company settings"
        } else {
            ""
        }
    );
    Ok(())
}

pub(crate) async fn run_stats(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let stats = vitrine_db::catalog_stats(pool, limit).await?;

    println!("total catalog views: {}", stats.total_catalog_views);
    if stats.ranking.is_empty() {
        println!("no products yet");
        return Ok(());
    }
    println!("{:>4}  {:>8}  {:<40}  slug", "#", "views", "product");
    for (position, detail) in stats.ranking.iter().enumerate() {
        let product = &detail.product;
        println!(
            "{:>4}  {:>8}  {:<40}  {}",
            position + 1,
            product.views_count,
            truncate(&product.name, 40),
            product.slug
        );
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

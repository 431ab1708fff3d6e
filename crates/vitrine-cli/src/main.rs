mod db;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vitrine-cli")]
#[command(about = "Vitrine catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Print catalog view totals and the most viewed products
    Stats {
        /// Number of products in the ranking (1-50)
        #[arg(long, default_value_t = vitrine_db::DEFAULT_RANKING_LIMIT)]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert categories, finishings and company settings from the seed file
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("vitrine-cli: pass --help to list commands");
        return Ok(());
    };

    let config = vitrine_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let pool = vitrine_db::connect_pool(
        &config.database_url,
        vitrine_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_ping(&pool).await?,
            DbCommands::Migrate => db::run_migrate(&pool).await?,
            DbCommands::Seed => db::run_seed(&pool, &config.seed_path).await?,
        },
        Commands::Stats { limit } => db::run_stats(&pool, limit).await?,
    }

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests;

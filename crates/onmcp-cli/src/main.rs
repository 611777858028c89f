mod crm;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "onmcp-cli")]
#[command(about = "onmcp CRM location sync command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run one full CRM location sync
    Sync {
        /// Keep locations the CRM no longer returns instead of tombstoning them
        #[arg(long)]
        no_prune: bool,
        /// Override the pagination guard (ONMCP_SYNC_MAX_PAGES)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_pages: Option<u32>,
    },
    /// List stored CRM locations
    Locations {
        /// Maximum number of locations to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Show agency status and recent sync runs
    Status {
        /// Number of recent sync runs to show
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = onmcp_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = onmcp_db::PoolConfig::from_app_config(&config);
    let pool = onmcp_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = onmcp_db::run_migrations(&pool).await?;
            println!("migrations up to date ({applied} applied)");
        }
        Commands::Sync {
            no_prune,
            max_pages,
        } => {
            let mut options = onmcp_sync::SyncOptions::from_app_config(&config);
            options.prune_missing = !no_prune;
            if let Some(max_pages) = max_pages {
                options.max_pages = max_pages;
            }
            crm::run_sync(&pool, &config, &options).await?;
        }
        Commands::Locations { limit } => crm::run_locations(&pool, limit).await?,
        Commands::Status { limit } => crm::run_status(&pool, &config, limit).await?,
    }

    Ok(())
}

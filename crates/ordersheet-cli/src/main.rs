mod manifest;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ordersheet_core::{load_platforms, AppConfig, Table};
use ordersheet_db::{MemoryStore, PgSheetStore, TableStore};
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use crate::pipeline::{BatchReport, StageOutcome};

/// Tables the ingest stages read or append to.
const INGEST_TABLES: [Table; 4] = [Table::Customer, Table::Order, Table::Delivery, Table::Option];

/// Tables the manifest view reads or appends to.
const MANIFEST_TABLES: [Table; 6] = [
    Table::Delivery,
    Table::Order,
    Table::Customer,
    Table::OptionSku,
    Table::Sku,
    Table::Manifest,
];

#[derive(Debug, Parser)]
#[command(name = "ordersheet")]
#[command(about = "Marketplace order export ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Append one marketplace export to the customer, order and delivery tables
    Ingest {
        /// Platform code from the platforms file (e.g. 11st, naver, coupang)
        #[arg(long, value_name = "CODE")]
        platform: String,
        /// Path to the exported .xlsx/.xls workbook
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
        /// Run every stage against an in-memory copy and write nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Build the shipping manifest from the latest batch
    Manifest {
        #[arg(long)]
        dry_run: bool,
    },
    /// List configured platforms
    Platforms,
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Migrate,
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("ordersheet: no command given (try --help)");
        return Ok(());
    };

    let config = ordersheet_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Ingest {
            platform,
            file,
            dry_run,
        } => run_ingest(&config, &platform, &file, dry_run).await,
        Commands::Manifest { dry_run } => run_manifest(&config, dry_run).await,
        Commands::Platforms => list_platforms(&config),
        Commands::Db { command } => run_db(&config, command).await,
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = ordersheet_db::PoolConfig::from_app_config(config);
    Ok(ordersheet_db::connect_pool(&config.database_url, pool_config).await?)
}

/// Opens the Postgres store, migrating and seeding headers unless `dry_run`,
/// in which case `tables` are copied into a [`MemoryStore`] instead.
async fn open_store(
    config: &AppConfig,
    tables: &[Table],
    dry_run: bool,
) -> anyhow::Result<Box<dyn TableStore>> {
    let store = PgSheetStore::new(connect(config).await?);
    if dry_run {
        let memory = MemoryStore::preload(&store, tables).await?;
        tracing::info!(tables = tables.len(), "dry run: working on an in-memory copy");
        return Ok(Box::new(memory));
    }

    let applied = ordersheet_db::run_migrations(store.pool()).await?;
    let created = store.ensure_headers().await?;
    tracing::debug!(applied, created, "store ready");
    Ok(Box::new(store))
}

fn prefix(dry_run: bool) -> &'static str {
    if dry_run {
        "[dry-run] "
    } else {
        ""
    }
}

async fn run_ingest(
    config: &AppConfig,
    code: &str,
    file: &std::path::Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let platforms = load_platforms(&config.platforms_path)?;
    let store = open_store(config, &INGEST_TABLES, dry_run).await?;
    let now = chrono::Local::now().naive_local();

    let report: BatchReport =
        pipeline::run_ingest(store.as_ref(), &platforms, code, file, config, now).await?;
    report.print_summary(prefix(dry_run));

    let failed = report.failed_stages();
    if failed > 0 {
        anyhow::bail!("{failed} stage(s) failed for platform '{}'", report.platform);
    }
    Ok(())
}

async fn run_manifest(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let store = open_store(config, &MANIFEST_TABLES, dry_run).await?;
    let outcome = StageOutcome::from(manifest::run_manifest(store.as_ref()).await?);
    println!("{}manifest: {outcome}", prefix(dry_run));
    Ok(())
}

fn list_platforms(config: &AppConfig) -> anyhow::Result<()> {
    let platforms = load_platforms(&config.platforms_path)?;
    for p in &platforms.platforms {
        let note = if p.workbook.encrypted {
            " (encrypted export)"
        } else {
            ""
        };
        println!("{:<8} {:<12} tag={}{note}", p.code, p.label, p.tag);
    }
    Ok(())
}

async fn run_db(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    match command {
        DbCommands::Migrate => {
            let applied = ordersheet_db::run_migrations(&pool).await?;
            let created = PgSheetStore::new(pool).ensure_headers().await?;
            println!("migrations applied: {applied}, table headers created: {created}");
        }
        DbCommands::Ping => {
            ordersheet_db::ping(&pool).await?;
            println!("database reachable");
        }
    }
    Ok(())
}

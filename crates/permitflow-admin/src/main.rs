use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use permitflow_core::clock::SystemClock;
use permitflow_core::refresh::{RefreshEngine, RefreshMode};
use permitflow_core::resolver::BaselineResolver;
use permitflow_core::types::{MetricType, Period};
use permitflow_repository::{connect, run_migrations, PostgresBaselineStore, PostgresRoutingLog};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "PermitFlow baseline administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the station baseline table from the routing log
    Refresh(RefreshArgs),
    /// List persisted baselines for one period
    List(ListArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Live,
    Legacy,
}

#[derive(Args, Debug)]
struct RefreshArgs {
    /// Which window set to compute
    #[arg(long, value_enum, default_value = "live")]
    mode: Mode,
    /// Skip running embedded database migrations first
    #[arg(long)]
    skip_migrations: bool,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Period label: current, baseline, all, recent_6mo, or a calendar year
    #[arg(long, default_value = "current")]
    period: String,
    /// Optional metric filter: initial or revision
    #[arg(long)]
    metric: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Refresh(args) => handle_refresh(args).await,
        Command::List(args) => handle_list(args).await,
    }
}

fn database_url() -> Result<String> {
    dotenvy::dotenv().ok();
    env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

async fn handle_refresh(args: RefreshArgs) -> Result<()> {
    let url = database_url()?;
    let pool = connect(&url, 5).await?;

    if args.skip_migrations {
        info!("Skipping migrations at user request");
    } else {
        run_migrations(&pool).await?;
    }

    let store = Arc::new(PostgresBaselineStore::new(pool.clone()));
    let log = Arc::new(PostgresRoutingLog::new(pool));
    let engine = RefreshEngine::new(log, store, Arc::new(SystemClock));

    let mode = match args.mode {
        Mode::Live => RefreshMode::Live,
        Mode::Legacy => RefreshMode::Legacy,
    };
    let report = engine.run(mode).await?;

    println!("Wrote {} baseline rows.", report.rows_written);
    if !report.failures.is_empty() {
        println!("{} combinations failed:", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.combination, failure.error);
        }
    }

    Ok(())
}

async fn handle_list(args: ListArgs) -> Result<()> {
    let period = Period::parse(&args.period)?;
    let metric = args.metric.as_deref().map(MetricType::parse).transpose()?;

    let url = database_url()?;
    let pool = connect(&url, 5).await?;
    let resolver = BaselineResolver::new(Arc::new(PostgresBaselineStore::new(pool)));

    let rows = resolver.list_baselines(period, metric).await?;
    if rows.is_empty() {
        println!("No baselines for period '{}'.", args.period);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(["station", "metric", "p25", "p50", "p75", "p90", "samples"]);
    for row in &rows {
        table.add_row([
            row.station.clone(),
            row.metric_type.as_str().to_string(),
            fmt_days(row.p25_days),
            fmt_days(row.p50_days),
            fmt_days(row.p75_days),
            fmt_days(row.p90_days),
            row.sample_count.to_string(),
        ]);
    }
    println!("{table}");

    Ok(())
}

fn fmt_days(value: Option<f64>) -> String {
    match value {
        Some(days) => format!("{days:.1}"),
        None => "-".to_string(),
    }
}

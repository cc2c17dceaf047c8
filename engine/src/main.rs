//! Clarus command line
//!
//! Drives the engine against the file-backed store:
//! - list reports
//! - print a report's monthly projection or cash-flow health
//! - export and import JSON backups

use anyhow::Context;
use clap::{Parser, Subcommand};
use clarus_engine::calculations::get_health_status;
use clarus_engine::config::{AppConfig, LogFormat};
use clarus_engine::storage::FileStore;
use clarus_engine::{AppError, PersistenceStore, ReportsApi, ReportsService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clarus", version, about = "Personal finance projections")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored reports
    List,
    /// Print the month-by-month projection of a report
    Project {
        id: String,
        /// Only print the first N months
        #[arg(long)]
        months: Option<usize>,
    },
    /// Print the cash-flow health summary of a report
    Health { id: String },
    /// Write a backup of every report and snapshot
    Export {
        /// Target file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace all data with a backup file
    Import { file: PathBuf },
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("clarus_engine={0},clarus={0}", config.log_level).into()
    });

    // Logs go to stderr so command output stays pipeable
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    init_tracing(&config);

    info!("Data directory: {}", config.data_dir.display());
    info!("Log level: {}", config.log_level);

    let storage = FileStore::open(&config.data_dir).await.map_err(|e| {
        error!("Failed to open data directory: {}", e);
        AppError::from(e)
    })?;
    let store = Arc::new(PersistenceStore::new(Arc::new(storage)));
    let service = ReportsService::open(store)
        .await?
        .with_max_simulation_years(config.max_simulation_years);

    run(&service, cli.command).await
}

async fn run(service: &impl ReportsApi, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List => {
            for report in service.reports().await {
                println!(
                    "{}  {}  ({} years from {})",
                    report.id, report.name, report.simulation_years, report.start_date
                );
            }
        }

        Command::Project { id, months } => {
            let projections = service.get_projections(&id).await?;
            let limit = months.unwrap_or(projections.len());
            for month in projections.iter().take(limit) {
                let markers = month
                    .markers
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                println!(
                    "{:>4}  {}  in {:>12}  out {:>12}  yield {:>12}  total {:>14}  {}",
                    month.month_index,
                    month.date,
                    month.inflow.round_dp(2),
                    month.outflow.round_dp(2),
                    month.yield_amount.round_dp(2),
                    month.final_amount.round_dp(2),
                    markers
                );
            }

            let goal_hit = service.get_goal_hit(&id).await?;
            match (goal_hit.goal_hit_index, goal_hit.goal_hit_date) {
                (Some(index), Some(date)) => println!("Goal reached in month {} ({})", index, date),
                _ => println!("Goal not reached within the horizon"),
            }
        }

        Command::Health { id } => {
            let summary = service.get_health_summary(&id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!("Status: {}", get_health_status(summary.percent_kept));
        }

        Command::Export { output } => {
            let backup = service.export_backup().await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, backup)
                        .await
                        .with_context(|| format!("writing backup to {}", path.display()))?;
                    info!("Backup written to {}", path.display());
                }
                None => println!("{}", backup),
            }
        }

        Command::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading backup from {}", file.display()))?;
            let summary = service.import_backup(&text).await?;
            println!(
                "Imported {} reports and {} snapshots",
                summary.reports_count, summary.snapshots_count
            );
        }
    }

    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grid_ledger::config::AppConfig;
use grid_ledger::storage::{self, Database};
use grid_ledger::{calculate, import, ingest};

#[derive(Parser)]
#[command(name = "grid-ledger")]
#[command(about = "Sim-racing league Elo rating and statistics batch updater")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest new spreadsheets and update ratings and statistics
    #[command(visible_aliases = ["update-races", "process-all"])]
    Import {
        /// Directory of race spreadsheets (overrides the config file)
        #[arg(long)]
        input_dir: Option<PathBuf>,
    },

    /// Recompute statistics for every pilot in the database
    #[command(visible_alias = "calculate-all")]
    RecalcStats,

    /// Debug utilities
    Debug {
        #[command(subcommand)]
        action: DebugAction,
    },
}

#[derive(Subcommand)]
enum DebugAction {
    /// Parse a single workbook and print the extracted race sheet
    ParseSheet { path: PathBuf },

    /// Print the current leaderboard
    Standings {
        /// How many pilots to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting grid-ledger v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&cli.config)?;

    // Bare invocation behaves like `import`, matching how operators run
    // the batch from cron.
    let command = cli.command.unwrap_or(Commands::Import { input_dir: None });

    match command {
        Commands::Import { input_dir } => {
            let input_dir = input_dir.unwrap_or_else(|| config.input_dir.clone());
            let mut db = Database::open(&config.database_path)?;

            match import::run_import(&mut db, &input_dir) {
                Ok(outcome) => {
                    println!("\n=== Import Results ===");
                    println!("Sheets imported:  {}", outcome.files_imported);
                    println!("Files skipped:    {}", outcome.files_skipped);
                    println!("New races:        {}", outcome.races_created);
                    println!("Races reused:     {}", outcome.races_reused);
                    println!("Participants:     {}", outcome.participants_added);
                    println!("Pilots updated:   {}", outcome.pilots_updated);
                }
                Err(e) => {
                    tracing::error!("Import failed, transaction rolled back: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::RecalcStats => {
            let mut db = Database::open(&config.database_path)?;
            let count = calculate::recalculate_all(&mut db)?;
            println!("\n=== Recalculation Results ===");
            println!("Pilots recomputed: {}", count);
        }
        Commands::Debug { action } => match action {
            DebugAction::ParseSheet { path } => {
                let rows = ingest::read_workbook(&path)?;
                let sheet = ingest::parse_sheet(&path, &rows)?;
                println!("{}", serde_json::to_string_pretty(&sheet)?);
            }
            DebugAction::Standings { limit } => {
                let db = Database::open(&config.database_path)?;
                let pilots = storage::top_pilots_by_rating(db.connection(), limit)?;

                if pilots.is_empty() {
                    println!("No pilots in the database yet.");
                } else {
                    println!("=== Standings (top {}) ===\n", limit);
                    for (i, pilot) in pilots.iter().enumerate() {
                        println!(
                            "{:>3}. {:<24} {:>7.1}  ({} races, {} wins, {:.2}% podium)",
                            i + 1,
                            pilot.name,
                            pilot.rating,
                            pilot.race_count,
                            pilot.wins,
                            pilot.podium_percentage
                        );
                    }
                }
            }
        },
    }

    Ok(())
}

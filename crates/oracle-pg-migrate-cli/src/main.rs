//! oracle-pg-migrate CLI - Oracle to PostgreSQL schema and data migration.

use clap::{Parser, Subcommand};
use oracle_pg_migrate::{Config, MigrateError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "oracle-pg-migrate")]
#[command(about = "Oracle to PostgreSQL schema and data migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON report to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate the configured schemas
    Run {
        /// Migrate only these schemas instead of the configured list
        #[arg(long)]
        schema: Vec<String>,

        /// Skip index creation
        #[arg(long)]
        no_indexes: bool,

        /// Skip foreign key creation
        #[arg(long)]
        no_foreign_keys: bool,

        /// Log every generated statement before execution
        #[arg(long)]
        show_sql: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let cancel = setup_signal_handler();

    match cli.command {
        Commands::Run {
            schema,
            no_indexes,
            no_foreign_keys,
            show_sql,
        } => {
            // Apply overrides
            if !schema.is_empty() {
                config.migration.schemas = schema;
            }
            if no_indexes {
                config.migration.create_indexes = false;
            }
            if no_foreign_keys {
                config.migration.create_foreign_keys = false;
            }
            if show_sql {
                config.migration.show_sql = true;
            }
            config.validate()?;

            let orchestrator = Orchestrator::connect(config).await?;
            let report = orchestrator.run(Some(cancel)).await?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("\nMigration {}", report.status);
                println!("  Run ID: {}", report.run_id);
                println!("  Duration: {:.2}s", report.duration_seconds);
                for schema in &report.schemas {
                    println!(
                        "  {}: {} ({} tables, {} rows, {} constraints, {} indexes)",
                        schema.schema,
                        schema.status,
                        schema.tables_migrated,
                        schema.rows_copied,
                        schema.constraints_added,
                        schema.indexes_created
                    );
                    if !schema.failed_objects.is_empty() {
                        println!("    Failed objects: {:?}", schema.failed_objects);
                    }
                }
            }

            if report.status != "completed" {
                return Err(MigrateError::Config(format!(
                    "migration finished with status: {}",
                    report.status
                )));
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Flip the cancellation channel on Ctrl-C. The orchestrator stops between
/// phases, never mid-statement.
fn setup_signal_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Finishing the current statement, then stopping...");
            let _ = tx.send(true);
        }
    });

    rx
}

//! # Billing Batch Entry Point
//!
//! Runs the periodic balance checkpoint job and one-shot maintenance
//! commands against the billing store. The HTTP layer lives elsewhere; this
//! binary is the single writer for balance checkpoints.

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use tokio::time::{Duration, interval};

use billing::config::ConfigLoader;
use billing::db::{health_check, init_pool};
use billing::logging::init_subscriber;
use billing::repositories::LedgerRepository;

#[derive(Parser)]
#[command(name = "billing", about = "Billing balance batch runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations and exit.
    Migrate,
    /// Run one balance checkpoint pass and exit.
    Calculate {
        /// Restrict the pass to these organization ids (default: all).
        #[arg(long = "organization-id")]
        organization_ids: Vec<i64>,
    },
    /// Run balance checkpoint passes forever on the configured cadence.
    Run {
        /// Override BILLING_BALANCE_INTERVAL_SECONDS.
        #[arg(long)]
        interval_seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load()?;
    init_subscriber(&config);

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;
    health_check(&db).await?;

    match cli.command {
        Command::Migrate => {
            Migrator::up(&db, None).await?;
            tracing::info!("Migrations applied");
        }
        Command::Calculate { organization_ids } => {
            Migrator::up(&db, None).await?;
            let ledger = LedgerRepository::new(&db);
            let targets = (!organization_ids.is_empty()).then_some(organization_ids);
            let balances = ledger.calculate_balances(targets).await?;
            for (organization_id, balance) in balances {
                tracing::info!(organization_id, balance, "Balance checkpoint");
            }
        }
        Command::Run { interval_seconds } => {
            Migrator::up(&db, None).await?;
            let cadence = interval_seconds.unwrap_or(config.balance_interval_seconds);
            let mut ticker = interval(Duration::from_secs(cadence));
            tracing::info!(interval_seconds = cadence, "Starting balance batch loop");

            let ledger = LedgerRepository::new(&db);
            loop {
                ticker.tick().await;
                match ledger.calculate_balances(None).await {
                    Ok(balances) => {
                        tracing::info!(organizations = balances.len(), "Balance pass complete");
                    }
                    // Leave retry policy to the operator; the next tick is a retry.
                    Err(e) => tracing::error!(error = %e, "Balance pass failed"),
                }
            }
        }
    }

    Ok(())
}

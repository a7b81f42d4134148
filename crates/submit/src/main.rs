use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use submit::storage::RetryingStore;
use submit::{CancelHandle, Cancellation, Config, VoteAggregator};
use submit_core::storage::{EntityStore, IdentityIndex};

#[cfg(feature = "dynamodb")]
type Backend = submit::storage::DynamoDbStore;

#[cfg(not(feature = "dynamodb"))]
type Backend = submit::storage::InMemoryStore;

/// Submit - festival submission store maintenance
#[derive(Parser, Debug)]
#[command(name = "submit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Table to operate on (overrides configuration)
    #[arg(long, global = true, env = "SUBMIT_TABLE_NAME")]
    table: Option<String>,

    /// Custom DynamoDB endpoint, e.g. http://localhost:8000
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SUBMIT_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute every submission's rank from its votes
    Tally {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up any entity by id and print its record as JSON
    Find {
        /// Entity id to resolve
        entity_id: String,
    },
    /// Create the table and its identity index if missing
    #[cfg(feature = "dynamodb")]
    CreateTable,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(table) = cli.table {
        config.table_name = table;
    }
    if let Some(endpoint_url) = cli.endpoint_url {
        config.endpoint_url = Some(endpoint_url);
    }

    let (handle, cancel) = Cancellation::new();
    tokio::spawn(cancel_on_ctrl_c(handle));

    let backend = Arc::new(open_backend(&config).await);
    let store = RetryingStore::new(backend.clone(), config.retry_policy())
        .with_cancellation(cancel.clone());
    let store = Arc::new(store);

    match cli.command {
        Command::Tally { json } => tally(store, cancel, json).await,
        Command::Find { entity_id } => find(store.as_ref(), &entity_id).await,
        #[cfg(feature = "dynamodb")]
        Command::CreateTable => {
            submit::storage::dynamodb::create_table(
                backend.client(),
                &config.table_name,
                &config.entity_id_index,
            )
            .await?;
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "submit=info,submit_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output on stdout stays machine readable.
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(feature = "dynamodb")]
async fn open_backend(config: &Config) -> Backend {
    Backend::from_config(config).await
}

#[cfg(not(feature = "dynamodb"))]
async fn open_backend(config: &Config) -> Backend {
    tracing::warn!("Built without the dynamodb feature; using an empty in-memory store");
    Backend::new().with_scan_page_size(config.scan_page_size as usize)
}

async fn tally<S>(store: Arc<S>, cancel: Cancellation, json: bool) -> Result<()>
where
    S: EntityStore + 'static,
{
    let report = VoteAggregator::new(store)
        .with_cancellation(cancel)
        .run()
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "scanned {} records in {} pages; ranked {} submissions ({} orphaned, {} conflicting, {} failed)",
            report.scanned,
            report.pages,
            report.ranked,
            report.orphaned,
            report.conflicting,
            report.failed.len()
        );
    }

    if !report.is_complete() {
        bail!("{} ranks could not be written", report.failed.len());
    }
    Ok(())
}

async fn find<S>(store: &S, entity_id: &str) -> Result<()>
where
    S: IdentityIndex,
{
    let record = store.find_by_entity_id(entity_id).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Cancel in-flight work on Ctrl+C.
async fn cancel_on_ctrl_c(handle: CancelHandle) {
    if signal::ctrl_c().await.is_ok() {
        tracing::info!("Received Ctrl+C, cancelling...");
        handle.cancel();
    }
}

use clap::Parser;
use fithome::application::checkout::{CheckoutOutcome, CheckoutService};
use fithome::application::gateway::AuthorizationGateway;
use fithome::application::manager::SubscriptionManager;
use fithome::domain::ports::{Clock, RandomSource, ReceiptStoreBox, SubscriptionStoreBox};
use fithome::domain::subscription::SubscriptionStatus;
use fithome::infrastructure::clock::SystemClock;
use fithome::infrastructure::in_memory::{InMemoryReceiptStore, InMemorySubscriptionStore};
use fithome::infrastructure::json_file::JsonFileStore;
use fithome::infrastructure::random::{SeededRandom, ThreadRandom};
use fithome::interfaces::csv::attempt_reader::{AttemptReader, CheckoutAttempt};
use fithome::interfaces::csv::outcome_writer::{OutcomeRow, OutcomeWriter};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input checkout attempts CSV file
    input: PathBuf,

    /// Directory for device-local JSON state (in-memory if omitted)
    #[arg(long)]
    state_path: Option<PathBuf>,

    /// Path to persistent RocksDB database
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Seed for the authorization randomness (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated authorization latency in milliseconds
    #[arg(long, default_value_t = 2000)]
    latency_ms: u64,

    /// Probability that a valid instrument is approved
    #[arg(long, default_value_t = 0.9)]
    approval_rate: f64,
}

impl Cli {
    fn stores(&self) -> Result<(SubscriptionStoreBox, ReceiptStoreBox)> {
        #[cfg(feature = "storage-rocksdb")]
        {
            if let Some(db_path) = &self.db_path {
                let store = fithome::infrastructure::rocksdb::RocksDbStore::open(db_path)
                    .into_diagnostic()?;
                return Ok((Box::new(store.clone()), Box::new(store)));
            }
        }

        if let Some(dir) = &self.state_path {
            let store = JsonFileStore::open(dir).into_diagnostic()?;
            Ok((Box::new(store.clone()), Box::new(store)))
        } else {
            Ok((
                Box::new(InMemorySubscriptionStore::new()),
                Box::new(InMemoryReceiptStore::new()),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let (subscription_store, receipt_store) = cli.stores()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let random: Arc<dyn RandomSource> = match cli.seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    };

    let gateway = AuthorizationGateway::new(random, clock.clone())
        .with_latency(Duration::from_millis(cli.latency_ms))
        .with_approval_rate(cli.approval_rate);
    let manager = SubscriptionManager::new(subscription_store, receipt_store, clock.clone());
    let service = CheckoutService::new(gateway, manager, clock);

    // Process attempts
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = AttemptReader::new(file);
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());
    for (index, attempt_result) in reader.attempts().enumerate() {
        match attempt_result {
            Ok(attempt) => {
                let row = process_attempt(&service, index + 1, attempt).await;
                writer.write_row(&row).into_diagnostic()?;
            }
            Err(e) => {
                eprintln!("Error reading attempt: {}", e);
            }
        }
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}

async fn process_attempt(
    service: &CheckoutService,
    row: usize,
    attempt: CheckoutAttempt,
) -> OutcomeRow {
    let plan_label = match attempt.plan.plan() {
        Some(plan) => plan.to_string(),
        None => "trial".to_string(),
    };

    let (outcome, transaction_id, detail) = match attempt.plan.plan() {
        Some(plan) => {
            let result = service.submit(attempt.form(), plan).await;
            let detail = result.message();
            match result {
                CheckoutOutcome::Approved { transaction_id } => {
                    ("approved", transaction_id, detail)
                }
                CheckoutOutcome::Declined { .. } => ("declined", String::new(), detail),
                CheckoutOutcome::Invalid { .. } => ("invalid", String::new(), detail),
                CheckoutOutcome::Failed { .. } => ("error", String::new(), detail),
            }
        }
        None => match service.manager().claim_trial().await {
            Ok(true) => ("trial_started", String::new(), "Trial started.".to_string()),
            Ok(false) => (
                "trial_rejected",
                String::new(),
                "Trial already used.".to_string(),
            ),
            Err(e) => {
                eprintln!("Error claiming trial: {}", e);
                ("error", String::new(), "Could not start trial.".to_string())
            }
        },
    };

    let status_after = service
        .manager()
        .status()
        .await
        .unwrap_or(SubscriptionStatus::Free);
    let full_access = service.manager().has_full_access().await.unwrap_or(false);

    OutcomeRow {
        row,
        plan: plan_label,
        outcome,
        transaction_id,
        detail,
        status_after,
        full_access,
    }
}

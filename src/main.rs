use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payout_pipeline::application::processor::PayoutProcessor;
use payout_pipeline::application::scheduler::{PayoutScheduler, RetryPolicy, SchedulerConfig};
use payout_pipeline::application::service::PayoutService;
use payout_pipeline::domain::ports::{PaymentGatewayRef, PayoutStore, PayoutStoreRef};
use payout_pipeline::infrastructure::gateway::{GatewayConfig, SimulatedGateway};
use payout_pipeline::infrastructure::in_memory::InMemoryPayoutStore;
use payout_pipeline::interfaces::csv::payout_reader::PayoutReader;
use payout_pipeline::interfaces::csv::report_writer::ReportWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input payout requests CSV file (amount, currency, recipient, comment)
    input: PathBuf,

    /// Delay between creating a record and its first processing attempt
    #[arg(long, default_value_t = 5000)]
    enqueue_delay_ms: u64,

    /// Lower bound of the simulated gateway latency
    #[arg(long, default_value_t = 2000)]
    min_latency_ms: u64,

    /// Upper bound of the simulated gateway latency
    #[arg(long, default_value_t = 5000)]
    max_latency_ms: u64,

    /// Probability that the simulated gateway reports success
    #[arg(long, default_value_t = 0.75)]
    success_ratio: f64,

    /// Seed for the gateway's random source, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let gateway_config = GatewayConfig {
        min_latency: Duration::from_millis(cli.min_latency_ms),
        max_latency: Duration::from_millis(cli.max_latency_ms),
        success_ratio: cli.success_ratio,
    };
    let gateway: PaymentGatewayRef = match cli.seed {
        Some(seed) => Arc::new(SimulatedGateway::seeded(gateway_config, seed)),
        None => Arc::new(SimulatedGateway::new(gateway_config)),
    };
    let store: PayoutStoreRef = Arc::new(InMemoryPayoutStore::new());

    let processor = Arc::new(PayoutProcessor::new(Arc::clone(&store), gateway));
    let (scheduler, queue) = PayoutScheduler::new(
        processor,
        RetryPolicy::default(),
        SchedulerConfig {
            worker_count: cli.workers,
        },
    );
    let scheduler = tokio::spawn(scheduler.run());

    let service = PayoutService::new(Arc::clone(&store), Arc::new(queue))
        .with_enqueue_delay(Duration::from_millis(cli.enqueue_delay_ms));

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = PayoutReader::new(file);
    for request in reader.payouts() {
        match request {
            Ok(new) => {
                if let Err(e) = service.create(new).await {
                    eprintln!("Error creating payout: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading payout request: {}", e);
            }
        }
    }

    // Closing the queue lets the scheduler drain its jobs and return.
    drop(service);
    scheduler.await.into_diagnostic()?;

    let payouts = store.list().await.into_diagnostic()?;
    let stdout = io::stdout();
    let writer = ReportWriter::new(stdout.lock());
    writer.write_payouts(payouts).into_diagnostic()?;

    Ok(())
}

//! fetchall command-line entry point.

use fetchall::config::Config;
use fetchall::output::ResultPrinter;
use fetchall::{Coordinator, HttpTransport};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging; stdout is reserved for the report
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        targets = config.targets.len(),
        timeout_ms = config.timeout.map(|t| t.as_millis() as u64),
        max_concurrency = config.max_concurrency,
        format = ?config.format,
        "Starting fetchall"
    );

    let transport = HttpTransport::new(&config.user_agent)?;
    let coordinator = Coordinator::with_options(transport, config.batch_options());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding requests");
            on_interrupt.cancel();
        }
    });

    // Stop fetching once stdout is gone
    let mut printer = ResultPrinter::new(std::io::stdout(), config.format);
    let on_output_error = cancel.clone();
    let report = coordinator
        .run_batch_observed(config.resolved_targets(), cancel, |result| {
            if !printer.print(result) && !on_output_error.is_cancelled() {
                warn!("Output closed, cancelling outstanding requests");
                on_output_error.cancel();
            }
        })
        .await?;

    printer.finish(&report)?;

    Ok(())
}

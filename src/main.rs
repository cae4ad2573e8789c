//! LogMetrics Collector Binary
//!
//! Accepts one producer connection and reports running statistics.

use clap::Parser;
use logmetrics::config::{CollectorConfig, MessageBoundary, ReportFormat};
use logmetrics::server::{ConsoleReporter, MetricsServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "logmetrics-collector")]
#[command(about = "Collect log lines over TCP and report message statistics")]
#[command(version)]
struct Args {
    /// IPv4 address to bind to (e.g. 127.0.0.1, 0.0.0.0)
    host: String,

    /// Port to listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Print stats after every N messages
    #[arg(value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    message_interval: u64,

    /// Print stats after T seconds of inactivity, if anything changed
    #[arg(value_name = "T", value_parser = clap::value_parser!(u64).range(1..))]
    inactivity_timeout: u64,

    /// Configuration file with additional settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Message boundary policy
    #[arg(long, value_enum)]
    boundary: Option<MessageBoundary>,

    /// Report output format
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if args.verbose {
            "logmetrics=debug,info"
        } else {
            "logmetrics=info,warn,error"
        })
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Starting LogMetrics Collector v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => CollectorConfig::from_file(path)?,
        None => CollectorConfig::default(),
    };

    // Positional arguments always win over the file
    config.server.host = args.host;
    config.server.port = args.port;
    config.reporting.message_interval = args.message_interval;
    config.reporting.inactivity_timeout_ms = args.inactivity_timeout.saturating_mul(1000);
    if let Some(boundary) = args.boundary {
        config.server.message_boundary = boundary;
    }
    if let Some(format) = args.format {
        config.reporting.format = format;
    }

    config.validate()?;

    info!(
        "Stats will be printed every {} messages or after {} seconds of inactivity",
        config.reporting.message_interval, args.inactivity_timeout
    );

    let reporter = Arc::new(ConsoleReporter::new(config.reporting.format));
    let server = match MetricsServer::new(config, reporter).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start collector: {}", e);
            std::process::exit(1);
        }
    };

    info!("Waiting for producer connection on {}", server.local_addr());

    let shutdown_tx = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    });

    match server.run().await {
        Ok(outcome) => info!("LogMetrics Collector stopped ({:?})", outcome),
        Err(e) => {
            error!("Collector error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

//! LogMetrics collector implementation

pub mod collector;
pub mod framing;
pub mod processor;
pub mod report;
pub mod tcp;

use crate::config::CollectorConfig;
use crate::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub use collector::MetricsCollector;
pub use framing::MessageFramer;
pub use processor::MessageProcessor;
pub use report::{ConsoleReporter, Report, ReportSink, ReportTrigger};
pub use tcp::{ClientConnection, ReceiveOutcome, TcpServer};

/// Collector that coordinates the transport and the report scheduler
pub struct MetricsServer {
    server: TcpServer,
    processor: MessageProcessor,
    shutdown_tx: broadcast::Sender<()>,
}

impl MetricsServer {
    /// Validate the configuration and bind the listening socket
    pub async fn new(config: CollectorConfig, sink: Arc<dyn ReportSink>) -> Result<Self> {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let server = TcpServer::bind(&config.server, shutdown_rx).await?;
        let processor = MessageProcessor::new(config.reporting, sink);

        Ok(Self {
            server,
            processor,
            shutdown_tx,
        })
    }

    /// Address the collector is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Handle for requesting a graceful shutdown from another task
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Accept one producer and aggregate its stream until it disconnects or
    /// shutdown is requested
    pub async fn run(self) -> Result<ReceiveOutcome> {
        let Self {
            server,
            mut processor,
            shutdown_tx: _shutdown_tx,
        } = self;

        processor.start();

        let outcome = match server.accept().await {
            Ok(Some(mut connection)) => {
                connection
                    .receive(|message| {
                        // Already logged by the processor; the stream continues.
                        let _ = processor.process_message(message);
                    })
                    .await
            }
            Ok(None) => Ok(ReceiveOutcome::Shutdown),
            Err(e) => Err(e),
        };

        processor.stop().await;

        match &outcome {
            Ok(outcome) => info!(?outcome, "Collector stopped"),
            Err(e) => warn!(error = %e, "Collector stopped on transport error"),
        }
        outcome
    }
}

//! # LogMetrics - Log Shipping and Streaming Statistics
//!
//! LogMetrics ships formatted log lines from a producer process to a collector
//! process over TCP and turns the received stream into running statistics.
//!
//! ## Features
//!
//! - **Wire Format**: `[<timestamp>] [<SEVERITY>] <payload>` lines, one per send
//! - **Non-Blocking Transport**: readiness-polled connect, write and receive cycles
//! - **Streaming Statistics**: counters, per-severity breakdown, length extrema and
//!   a sliding one-hour window
//! - **Report Scheduling**: reports every N messages or after a period of inactivity
//!
//! ## Quick Start
//!
//! ### Collector
//! ```no_run
//! use logmetrics::config::CollectorConfig;
//! use logmetrics::server::{ConsoleReporter, MetricsServer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CollectorConfig::default();
//!     let reporter = Arc::new(ConsoleReporter::new(config.reporting.format));
//!     let server = MetricsServer::new(config, reporter).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Producer
//! ```no_run
//! use logmetrics::client::Logger;
//! use logmetrics::types::Severity;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let addr = "127.0.0.1:9000".parse()?;
//!     let logger = Logger::to_socket(addr, Duration::from_millis(1000), Severity::Info).await?;
//!
//!     logger.info("Authentication successful").await?;
//!     logger.error("Database unreachable").await?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod server;
pub mod types;

/// Common error types used throughout LogMetrics
pub mod error {
    use crate::types::ParseError;

    /// LogMetrics error types
    #[derive(Debug, thiserror::Error)]
    pub enum LogMetricsError {
        /// Bind, listen, connect, accept or socket setup failed
        #[error("Transport error: {0}")]
        Transport(String),
        /// I/O failed mid-stream
        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),
        /// A wire line could not be parsed
        #[error("Parse error: {0}")]
        Parse(#[from] ParseError),
        /// Configuration error
        #[error("Configuration error: {0}")]
        Config(String),
        /// Serialization failed
        #[error("Serialization error: {0}")]
        Serde(#[from] serde_json::Error),
    }

    /// Result type alias for LogMetrics operations
    pub type Result<T> = std::result::Result<T, LogMetricsError>;
}

pub use error::{LogMetricsError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{FileSink, LogSink, Logger, SocketSink};
    pub use crate::config::{CollectorConfig, ProducerConfig};
    pub use crate::server::{MessageProcessor, MetricsCollector, MetricsServer, Report, ReportSink};
    pub use crate::types::{MessageStats, ParseError, Severity};
    pub use crate::{LogMetricsError, Result};
}

//! Logger facade that formats wire lines and fans them out to sinks

use crate::client::{FileSink, LogSink, SocketSink};
use crate::types::{format_line, Severity};
use crate::{LogMetricsError, Result};
use parking_lot::RwLock;
use std::net::SocketAddrV4;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;

/// Producer-side logger writing formatted lines to every attached sink
#[derive(Clone)]
pub struct Logger {
    sinks: Arc<Mutex<Vec<Box<dyn LogSink>>>>,
    min_level: Arc<RwLock<Severity>>,
}

impl Logger {
    /// Create a logger with no sinks
    pub fn new(min_level: Severity) -> Self {
        Self {
            sinks: Arc::new(Mutex::new(Vec::new())),
            min_level: Arc::new(RwLock::new(min_level)),
        }
    }

    /// Create a logger appending to a file
    pub async fn to_file<P: AsRef<Path>>(path: P, min_level: Severity) -> Result<Self> {
        let sink = FileSink::open(path.as_ref()).await;
        if !sink.is_valid().await {
            return Err(LogMetricsError::Config(format!(
                "Failed to open log file: {}",
                path.as_ref().display()
            )));
        }

        let logger = Self::new(min_level);
        logger.add_sink(Box::new(sink)).await;
        Ok(logger)
    }

    /// Create a logger shipping lines to a collector
    pub async fn to_socket(
        addr: SocketAddrV4,
        timeout: Duration,
        min_level: Severity,
    ) -> Result<Self> {
        let sink = SocketSink::new(addr, timeout);
        sink.connect().await?;

        let logger = Self::new(min_level);
        logger.add_sink(Box::new(sink)).await;
        Ok(logger)
    }

    /// Attach another sink
    pub async fn add_sink(&self, sink: Box<dyn LogSink>) {
        self.sinks.lock().await.push(sink);
    }

    /// Number of attached sinks
    pub async fn sink_count(&self) -> usize {
        self.sinks.lock().await.len()
    }

    /// Minimum severity that is forwarded
    pub fn min_level(&self) -> Severity {
        *self.min_level.read()
    }

    /// Change the minimum severity
    pub fn set_min_level(&self, level: Severity) {
        *self.min_level.write() = level;
    }

    /// True when at least one sink is still valid
    pub async fn is_valid(&self) -> bool {
        let sinks = self.sinks.lock().await;
        for sink in sinks.iter() {
            if sink.is_valid().await {
                return true;
            }
        }
        false
    }

    /// Log a message at the given severity.
    ///
    /// Messages below the minimum level are dropped. Every sink is written even
    /// if an earlier one fails; the first failure is returned.
    pub async fn log(&self, message: &str, level: Severity) -> Result<()> {
        if level < self.min_level() {
            return Ok(());
        }

        let line = format_line(message, level);
        let sinks = self.sinks.lock().await;

        let mut first_error = None;
        for sink in sinks.iter() {
            if let Err(e) = sink.write(&line).await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Log a message at the minimum level
    pub async fn log_default(&self, message: &str) -> Result<()> {
        self.log(message, self.min_level()).await
    }

    /// Log a debug message
    pub async fn debug<S: AsRef<str>>(&self, message: S) -> Result<()> {
        self.log(message.as_ref(), Severity::Debug).await
    }

    /// Log an info message
    pub async fn info<S: AsRef<str>>(&self, message: S) -> Result<()> {
        self.log(message.as_ref(), Severity::Info).await
    }

    /// Log a warning message
    pub async fn warning<S: AsRef<str>>(&self, message: S) -> Result<()> {
        self.log(message.as_ref(), Severity::Warning).await
    }

    /// Log an error message
    pub async fn error<S: AsRef<str>>(&self, message: S) -> Result<()> {
        self.log(message.as_ref(), Severity::Error).await
    }

    /// Log a fatal message
    pub async fn fatal<S: AsRef<str>>(&self, message: S) -> Result<()> {
        self.log(message.as_ref(), Severity::Fatal).await
    }
}

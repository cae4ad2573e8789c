//! Report scheduling over the statistics collector

use crate::config::ReportSettings;
use crate::server::{MetricsCollector, Report, ReportSink, ReportTrigger};
use crate::types::{parse_line, ParseError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

struct Shared {
    collector: MetricsCollector,
    sink: Arc<dyn ReportSink>,
    // Last record or report.
    last_activity: Mutex<Instant>,
}

impl Shared {
    fn emit(&self, trigger: ReportTrigger) -> bool {
        let Some(stats) = self.collector.snapshot_and_mark_if_changed() else {
            return false;
        };
        debug!(?trigger, total = stats.total_messages, "Emitting report");
        self.sink.emit(&Report { trigger, stats });
        *self.last_activity.lock() = Instant::now();
        true
    }
}

/// Feeds messages into a [`MetricsCollector`] and fires reports.
///
/// Reports fire inline after every N-th message, and from a background timer
/// once the stream has been idle past the inactivity timeout with unreported
/// changes.
pub struct MessageProcessor {
    settings: ReportSettings,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
    timer: Option<JoinHandle<()>>,
}

impl MessageProcessor {
    /// Create a stopped processor
    pub fn new(settings: ReportSettings, sink: Arc<dyn ReportSink>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            settings,
            shared: Arc::new(Shared {
                collector: MetricsCollector::new(),
                sink,
                last_activity: Mutex::new(Instant::now()),
            }),
            shutdown_tx,
            timer: None,
        }
    }

    /// The underlying collector
    pub fn collector(&self) -> &MetricsCollector {
        &self.shared.collector
    }

    /// Whether the inactivity timer is running
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Start the inactivity timer task. Must be called within a Tokio runtime.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }

        *self.shared.last_activity.lock() = Instant::now();

        let shared = Arc::clone(&self.shared);
        let timeout = self.settings.inactivity_timeout();
        let cadence = self.settings.timer_cadence();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let idle = shared.last_activity.lock().elapsed();
                        if idle >= timeout {
                            shared.emit(ReportTrigger::Inactivity);
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
            debug!("Inactivity timer stopped");
        }));

        info!(
            interval = self.settings.message_interval,
            timeout_ms = self.settings.inactivity_timeout_ms,
            "Report scheduler started"
        );
    }

    /// Stop the timer task and wait for it to finish
    pub async fn stop(&mut self) {
        if let Some(handle) = self.timer.take() {
            let _ = self.shutdown_tx.send(());
            if let Err(e) = handle.await {
                warn!(error = %e, "Inactivity timer task failed");
            }
        }
    }

    /// Parse one raw message, record it and fire a count report if due.
    ///
    /// Malformed lines are logged and returned as errors; the statistics are
    /// left untouched.
    pub fn process_message(&self, raw: &str) -> Result<(), ParseError> {
        debug!(line = raw, "Received log line");

        let line = parse_line(raw).map_err(|e| {
            warn!(error = %e, line = raw, "Failed to parse log line");
            e
        })?;

        let shared = &self.shared;
        // Marked active first so the timer cannot claim this message.
        *shared.last_activity.lock() = Instant::now();
        shared.collector.record(&line.payload, line.severity);

        if shared.collector.should_report(self.settings.message_interval) {
            shared.emit(ReportTrigger::MessageCount);
        }
        Ok(())
    }
}

impl Drop for MessageProcessor {
    fn drop(&mut self) {
        if self.timer.is_some() {
            // The task exits on its next poll; it cannot be awaited here.
            let _ = self.shutdown_tx.send(());
        }
    }
}

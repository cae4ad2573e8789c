//! Report values and the sinks that render them

use crate::config::ReportFormat;
use crate::types::MessageStats;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write as _;
use tracing::error;

/// Why a report was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTrigger {
    /// The message count reached a multiple of the interval
    MessageCount,
    /// The stream was idle past the inactivity timeout
    Inactivity,
}

/// A point-in-time snapshot handed to a report sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// What fired the report
    pub trigger: ReportTrigger,
    /// Statistics at the time of the report
    pub stats: MessageStats,
}

/// Receives reports from the scheduler
pub trait ReportSink: Send + Sync {
    /// Handle one report
    fn emit(&self, report: &Report);
}

impl<F> ReportSink for F
where
    F: Fn(&Report) + Send + Sync,
{
    fn emit(&self, report: &Report) {
        self(report)
    }
}

/// Render a report as the framed statistics table
pub fn render_text(stats: &MessageStats) -> String {
    let rule = "=".repeat(50);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "           MESSAGE STATISTICS");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Total messages: {}", stats.total_messages);
    let _ = writeln!(out, "Messages in last hour: {}", stats.messages_last_hour);

    let _ = writeln!(out, "\nMessages by log level:");
    for (level, count) in stats.messages_by_severity.iter().filter(|&(_, &c)| c > 0) {
        let _ = writeln!(out, "  {}: {}", level, count);
    }

    let _ = writeln!(out, "\nMessage length statistics:");
    if stats.total_messages > 0 {
        let _ = writeln!(out, "  Minimum length: {} characters", stats.min_length);
        let _ = writeln!(out, "  Maximum length: {} characters", stats.max_length);
        let _ = writeln!(out, "  Average length: {:.2} characters", stats.average_length);
    } else {
        let _ = writeln!(out, "  No data available");
    }
    let _ = writeln!(out, "{}", rule);

    out
}

/// Writes reports to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    format: ReportFormat,
}

impl ConsoleReporter {
    /// Create a reporter using the given rendering
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Render a report without printing it
    pub fn render(&self, report: &Report) -> crate::Result<String> {
        match self.format {
            ReportFormat::Text => Ok(render_text(&report.stats)),
            ReportFormat::Json => Ok(serde_json::to_string(report)?),
        }
    }
}

impl ReportSink for ConsoleReporter {
    fn emit(&self, report: &Report) {
        match self.render(report) {
            Ok(rendered) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{}", rendered) {
                    error!(error = %e, "Failed to write report");
                }
            }
            Err(e) => error!(error = %e, "Failed to render report"),
        }
    }
}

//! Thread-safe statistics aggregation

use crate::types::{MessageStats, Severity};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Width of the sliding window behind `messages_last_hour`
pub const WINDOW: Duration = Duration::from_secs(3600);

struct CollectorState {
    stats: MessageStats,
    // Arrival times, oldest first.
    timestamps: VecDeque<Instant>,
}

impl CollectorState {
    fn recompute_window(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) > WINDOW {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        self.stats.messages_last_hour = self.timestamps.len() as u64;
    }

    fn mark_reported(&mut self, now: Instant) -> MessageStats {
        self.recompute_window(now);
        self.stats.last_reported_total = self.stats.total_messages;
        self.stats.clone()
    }
}

/// Aggregates parsed messages into [`MessageStats`].
///
/// Every operation holds a single lock for its whole duration.
pub struct MetricsCollector {
    state: Mutex<CollectorState>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectorState {
                stats: MessageStats::default(),
                timestamps: VecDeque::new(),
            }),
        }
    }

    /// Record one message
    pub fn record(&self, payload: &str, severity: Severity) {
        self.record_at(payload, severity, Instant::now());
    }

    pub(crate) fn record_at(&self, payload: &str, severity: Severity, at: Instant) {
        let mut state = self.state.lock();
        state.stats.apply(payload.chars().count(), severity);
        state.timestamps.push_back(at);
    }

    /// Messages recorded within the last hour
    pub fn messages_last_hour(&self) -> u64 {
        let mut state = self.state.lock();
        state.recompute_window(Instant::now());
        state.stats.messages_last_hour
    }

    /// True when `total_messages` is a positive multiple of `interval`
    pub fn should_report(&self, interval: u64) -> bool {
        if interval == 0 {
            return false;
        }
        let state = self.state.lock();
        state.stats.total_messages > 0 && state.stats.total_messages % interval == 0
    }

    /// True when messages were recorded since the last report
    pub fn changed_since_last_report(&self) -> bool {
        let state = self.state.lock();
        state.stats.total_messages != state.stats.last_reported_total
    }

    /// Current statistics, without marking them reported
    pub fn snapshot(&self) -> MessageStats {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> MessageStats {
        let mut state = self.state.lock();
        state.recompute_window(now);
        state.stats.clone()
    }

    /// Current statistics, marking them as reported
    pub fn snapshot_and_mark_reported(&self) -> MessageStats {
        self.state.lock().mark_reported(Instant::now())
    }

    /// Like [`snapshot_and_mark_reported`](Self::snapshot_and_mark_reported),
    /// but only when something changed since the last report. The check and
    /// the mark happen under one lock acquisition.
    pub fn snapshot_and_mark_if_changed(&self) -> Option<MessageStats> {
        let mut state = self.state.lock();
        if state.stats.total_messages == state.stats.last_reported_total {
            return None;
        }
        Some(state.mark_reported(Instant::now()))
    }
}

//! Aggregate statistics record

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running statistics over every message recorded by a collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStats {
    /// Number of messages recorded
    pub total_messages: u64,
    /// Message count per severity, every severity present
    pub messages_by_severity: BTreeMap<Severity, u64>,
    /// Messages recorded within the last hour, as of the last window recompute
    pub messages_last_hour: u64,
    /// Shortest payload in characters, `usize::MAX` until the first message
    pub min_length: usize,
    /// Longest payload in characters
    pub max_length: usize,
    /// Mean payload length in characters
    pub average_length: f64,
    /// Sum of all payload lengths in characters
    pub total_length: u64,
    /// `total_messages` at the most recent report
    pub last_reported_total: u64,
}

impl Default for MessageStats {
    fn default() -> Self {
        Self {
            total_messages: 0,
            messages_by_severity: Severity::ALL.into_iter().map(|level| (level, 0)).collect(),
            messages_last_hour: 0,
            min_length: usize::MAX,
            max_length: 0,
            average_length: 0.0,
            total_length: 0,
            last_reported_total: 0,
        }
    }
}

impl MessageStats {
    /// Count recorded for one severity
    pub fn count(&self, severity: Severity) -> u64 {
        self.messages_by_severity.get(&severity).copied().unwrap_or(0)
    }

    /// Fold one payload length into the counters and length statistics
    pub(crate) fn apply(&mut self, length: usize, severity: Severity) {
        self.total_messages += 1;
        *self.messages_by_severity.entry(severity).or_insert(0) += 1;

        self.total_length += length as u64;
        self.min_length = self.min_length.min(length);
        self.max_length = self.max_length.max(length);
        self.average_length = self.total_length as f64 / self.total_messages as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stats() {
        let stats = MessageStats::default();

        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.min_length, usize::MAX);
        assert_eq!(stats.max_length, 0);
        assert_eq!(stats.average_length, 0.0);
        assert_eq!(stats.messages_by_severity.len(), 5);
        for level in Severity::ALL {
            assert_eq!(stats.count(level), 0);
        }
    }

    #[test]
    fn test_apply_updates_lengths() {
        let mut stats = MessageStats::default();
        stats.apply(4, Severity::Info);
        stats.apply(10, Severity::Info);

        assert_eq!(stats.total_messages, 2);
        assert_eq!(stats.count(Severity::Info), 2);
        assert_eq!(stats.min_length, 4);
        assert_eq!(stats.max_length, 10);
        assert_eq!(stats.average_length, 7.0);
    }

    #[test]
    fn test_stats_serialize_uses_wire_names() {
        let json = serde_json::to_value(MessageStats::default()).unwrap();
        assert_eq!(json["messages_by_severity"]["WARNING"], 0);
        assert_eq!(json["total_messages"], 0);
    }
}

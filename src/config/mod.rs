//! Configuration management for LogMetrics

pub mod settings;

pub use settings::{
    CollectorConfig, MessageBoundary, ProducerConfig, ReportFormat, ReportSettings, ServerSettings,
};

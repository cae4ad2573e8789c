//! Core data types shared by the producer and collector sides

pub mod severity;
pub mod stats;
pub mod wire;

pub use severity::{Severity, UnknownSeverity};
pub use stats::MessageStats;
pub use wire::{format_line, parse_line, ParseError, WireLine};

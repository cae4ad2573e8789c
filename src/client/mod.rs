//! LogMetrics producer side: sinks, the logger facade and console commands

pub mod command;
pub mod file_sink;
pub mod logger;
pub mod socket_sink;

use crate::Result;
use async_trait::async_trait;

pub use crate::types::Severity;
pub use command::{parse_command, Command};
pub use file_sink::FileSink;
pub use logger::Logger;
pub use socket_sink::{ConnectionState, SocketSink};

/// A destination for formatted wire lines
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Write one line; the sink adds its own terminator
    async fn write(&self, line: &str) -> Result<()>;

    /// Whether the sink can still accept lines
    async fn is_valid(&self) -> bool;
}

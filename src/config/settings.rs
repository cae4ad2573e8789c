//! Configuration structures for LogMetrics

use crate::types::Severity;
use crate::{LogMetricsError, Result};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How received bytes are cut into messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MessageBoundary {
    /// One message per complete `\n`-terminated line
    #[default]
    Lines,
    /// One message per readiness drain cycle, whatever it contains
    #[serde(alias = "drain")]
    #[value(alias = "drain")]
    DrainCycle,
}

/// How reports are rendered by the console reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Framed human-readable table
    #[default]
    Text,
    /// One JSON object per report
    Json,
}

/// Collector configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Listening socket settings
    pub server: ServerSettings,
    /// Report trigger settings
    pub reporting: ReportSettings,
}

/// Listening socket settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// IPv4 address to bind to
    pub host: String,
    /// TCP port to bind to, 0 picks an ephemeral port
    pub port: u16,
    /// Upper bound on a single readiness wait in milliseconds
    pub poll_timeout_ms: u64,
    /// Size of a single receive call in bytes
    pub buffer_size: usize,
    /// Longest line kept in `lines` mode; longer lines are discarded
    pub max_line_length: usize,
    /// Message boundary policy
    pub message_boundary: MessageBoundary,
}

/// Report trigger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Report after every N messages
    pub message_interval: u64,
    /// Report after this much inactivity if anything changed, in milliseconds
    pub inactivity_timeout_ms: u64,
    /// How often the inactivity timer wakes, in milliseconds
    pub timer_cadence_ms: u64,
    /// Console rendering
    pub format: ReportFormat,
}

/// Producer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Collector IPv4 address
    pub host: String,
    /// Collector TCP port
    pub port: u16,
    /// Connect and write readiness timeout in milliseconds
    pub timeout_ms: u64,
    /// Messages below this severity are dropped
    pub min_level: Severity,
    /// Also append every line to this file
    pub log_file: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            poll_timeout_ms: 1000,
            buffer_size: 4096,
            max_line_length: 64 * 1024,
            message_boundary: MessageBoundary::default(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            message_interval: 10,
            inactivity_timeout_ms: 30_000,
            timer_cadence_ms: 100,
            format: ReportFormat::default(),
        }
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            timeout_ms: 1000,
            min_level: Severity::Info,
            log_file: None,
        }
    }
}

fn parse_ipv4(host: &str) -> Result<Ipv4Addr> {
    host.parse::<Ipv4Addr>()
        .map_err(|_| LogMetricsError::Config(format!("Invalid IPv4 address: {}", host)))
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| LogMetricsError::Config(format!("Failed to read config file: {}", e)))?;

    toml::from_str(&content)
        .map_err(|e| LogMetricsError::Config(format!("Failed to parse config: {}", e)))
}

impl CollectorConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: CollectorConfig = read_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.reporting.validate()
    }
}

impl ServerSettings {
    /// Validate listening settings
    pub fn validate(&self) -> Result<()> {
        parse_ipv4(&self.host)?;
        if self.poll_timeout_ms == 0 {
            return Err(LogMetricsError::Config("Poll timeout must be positive".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(LogMetricsError::Config("Buffer size must be positive".to_string()));
        }
        if self.max_line_length == 0 {
            return Err(LogMetricsError::Config("Max line length must be positive".to_string()));
        }
        Ok(())
    }

    /// Address to bind to
    pub fn bind_addr(&self) -> Result<SocketAddrV4> {
        Ok(SocketAddrV4::new(parse_ipv4(&self.host)?, self.port))
    }

    /// Readiness wait bound
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

impl ReportSettings {
    /// Validate report settings
    pub fn validate(&self) -> Result<()> {
        if self.message_interval == 0 {
            return Err(LogMetricsError::Config("Message interval must be positive".to_string()));
        }
        if self.inactivity_timeout_ms == 0 {
            return Err(LogMetricsError::Config("Inactivity timeout must be positive".to_string()));
        }
        if self.timer_cadence_ms == 0 {
            return Err(LogMetricsError::Config("Timer cadence must be positive".to_string()));
        }
        Ok(())
    }

    /// Inactivity threshold
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    /// Timer wake interval
    pub fn timer_cadence(&self) -> Duration {
        Duration::from_millis(self.timer_cadence_ms)
    }
}

impl ProducerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: ProducerConfig = read_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        parse_ipv4(&self.host)?;
        if self.port == 0 {
            return Err(LogMetricsError::Config("Port must be between 1 and 65535".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(LogMetricsError::Config("Timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Collector address
    pub fn server_addr(&self) -> Result<SocketAddrV4> {
        Ok(SocketAddrV4::new(parse_ipv4(&self.host)?, self.port))
    }

    /// Connect and write readiness timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

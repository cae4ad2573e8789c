//! Severity levels carried on every wire line

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log severity levels, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Debug: diagnostic detail
    Debug = 0,
    /// Info: informational messages
    Info = 1,
    /// Warning: something unexpected but recoverable
    Warning = 2,
    /// Error: an operation failed
    Error = 3,
    /// Fatal: the producer cannot continue
    Fatal = 4,
}

impl Severity {
    /// All severities in ascending order
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Upper-case name used on the wire
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a token does not name one of the five severities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl fmt::Display for UnknownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown severity '{}'", self.0)
    }
}

impl std::error::Error for UnknownSeverity {}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSeverity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_from_str_is_case_insensitive() {
        assert_eq!("debug".parse::<Severity>().unwrap(), Severity::Debug);
        assert_eq!("Info".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("eRrOr".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!("fatal".parse::<Severity>().unwrap(), Severity::Fatal);
    }

    #[test]
    fn test_severity_from_str_rejects_unknown() {
        assert!("warn".parse::<Severity>().is_err());
        assert!("".parse::<Severity>().is_err());
        assert!(" INFO".parse::<Severity>().is_err());
        assert_eq!(
            "TRACE".parse::<Severity>().unwrap_err(),
            UnknownSeverity("TRACE".to_string())
        );
    }

    #[test]
    fn test_severity_display_round_trips() {
        for level in Severity::ALL {
            assert_eq!(level.to_string().parse::<Severity>().unwrap(), level);
        }
    }
}

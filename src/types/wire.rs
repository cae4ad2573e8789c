//! Wire line formatting and parsing
//!
//! A wire line has the layout `[<timestamp>] [<SEVERITY>] <payload>`. The
//! timestamp is local time with microsecond precision. The line terminator is
//! not part of the line; transports add and strip it.

use crate::types::Severity;
use chrono::Local;
use std::fmt;

/// `strftime` layout of the timestamp field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Reasons a wire line can be rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The first `[...]` pair is missing or unterminated
    #[error("missing or unterminated timestamp field")]
    MissingTimestamp,
    /// The second `[...]` pair is missing or unterminated
    #[error("missing or unterminated severity field")]
    MissingSeverity,
    /// The severity token is not one of the known names
    #[error("unknown severity '{0}'")]
    UnknownSeverity(String),
}

/// A parsed wire line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireLine {
    /// Severity named in the second field
    pub severity: Severity,
    /// Everything after the severity field, minus one leading whitespace run
    pub payload: String,
}

impl fmt::Display for WireLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.payload)
    }
}

/// Current local time rendered as a wire timestamp
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Format a payload into a wire line stamped with the current local time
pub fn format_line(payload: &str, severity: Severity) -> String {
    format!("[{}] [{}] {}", timestamp(), severity, payload)
}

/// Locate the next `[...]` pair at or after `from`, returning the byte offsets
/// of the opening and closing brackets.
fn bracket_pair(line: &str, from: usize) -> Option<(usize, usize)> {
    let open = from + line[from..].find('[')?;
    let close = open + line[open..].find(']')?;
    Some((open, close))
}

/// Parse a wire line into its severity and payload
pub fn parse_line(line: &str) -> Result<WireLine, ParseError> {
    let (_, ts_close) = bracket_pair(line, 0).ok_or(ParseError::MissingTimestamp)?;
    let (lvl_open, lvl_close) =
        bracket_pair(line, ts_close).ok_or(ParseError::MissingSeverity)?;

    let token = &line[lvl_open + 1..lvl_close];
    let severity = token
        .parse::<Severity>()
        .map_err(|_| ParseError::UnknownSeverity(token.to_string()))?;

    let payload = line[lvl_close + 1..].trim_start().to_string();

    Ok(WireLine { severity, payload })
}

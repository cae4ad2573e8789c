//! Console command parsing for the interactive producer

use crate::types::Severity;

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log `message`, at `level` if one was given
    Log {
        /// Text to ship
        message: String,
        /// Explicit severity, otherwise the logger default applies
        level: Option<Severity>,
    },
    /// Print command help
    Help,
    /// Stop the producer
    Exit,
}

/// Severity names accepted at the console, including the `warn` shorthand
fn parse_level(token: &str) -> Option<Severity> {
    if token.eq_ignore_ascii_case("warn") {
        return Some(Severity::Warning);
    }
    token.parse().ok()
}

/// Parse one console line.
///
/// Blank input yields `None`. A trailing token naming a severity sets the
/// level when at least one other token precedes it.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed {
        "exit" | "quit" => return Some(Command::Exit),
        "help" => return Some(Command::Help),
        _ => {}
    }

    if let Some((head, last)) = trimmed.rsplit_once(char::is_whitespace) {
        if let Some(level) = parse_level(last) {
            return Some(Command::Log {
                message: head.trim_end().to_string(),
                level: Some(level),
            });
        }
    }

    Some(Command::Log {
        message: trimmed.to_string(),
        level: None,
    })
}

/// Help text printed for the `help` command
pub const HELP_TEXT: &str = "\
Commands:
  <message> [level]  log <message>, level is one of debug, info, warning (warn), error, fatal
  help               show this help
  exit | quit        stop the producer";

#[cfg(test)]
mod tests {
    use super::*;

    fn log(message: &str, level: Option<Severity>) -> Option<Command> {
        Some(Command::Log {
            message: message.to_string(),
            level,
        })
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   \t\r\n"), None);
    }

    #[test]
    fn test_control_commands() {
        assert_eq!(parse_command("exit"), Some(Command::Exit));
        assert_eq!(parse_command("  quit \n"), Some(Command::Exit));
        assert_eq!(parse_command("help"), Some(Command::Help));
    }

    #[test]
    fn test_message_with_trailing_level() {
        assert_eq!(
            parse_command("disk is almost full warning"),
            log("disk is almost full", Some(Severity::Warning))
        );
        assert_eq!(parse_command("oops WARN"), log("oops", Some(Severity::Warning)));
        assert_eq!(parse_command("boom Fatal"), log("boom", Some(Severity::Fatal)));
    }

    #[test]
    fn test_message_without_level() {
        assert_eq!(parse_command("just a message"), log("just a message", None));
    }

    #[test]
    fn test_lone_level_token_is_a_message() {
        assert_eq!(parse_command("error"), log("error", None));
    }
}

use std::str::FromStr;

use crate::ambience::AmbientSound;
use crate::error::{OverlayError, Result};

/// Commands the display surface sends back into the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set the word goal (clamped by the tracker)
    Goal(i64),
    /// Zero the focus timer
    Reset,
    /// Start or stop an ambient sound
    Toggle(AmbientSound),
    /// Print the current status line again
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  goal <words>       set the writing goal (100-10000)
  reset              reset the focus timer
  <sound>            toggle rain, ocean, forest or dreams
  status             show the overlay line
  quit               exit";

impl FromStr for Command {
    type Err = OverlayError;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(OverlayError::InvalidCommand("empty command".to_string()));
        };
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(OverlayError::InvalidCommand(format!(
                "too many arguments: {}",
                line.trim()
            )));
        }

        match (head.to_ascii_lowercase().as_str(), arg) {
            ("goal", Some(words)) => words
                .replace(',', "")
                .parse::<i64>()
                .map(Command::Goal)
                .map_err(|_| OverlayError::InvalidCommand(format!("not a number: {}", words))),
            ("goal", None) => Err(OverlayError::InvalidCommand(
                "goal needs a word count".to_string(),
            )),
            ("reset", None) => Ok(Command::Reset),
            ("sound" | "toggle", Some(name)) => name.parse().map(Command::Toggle),
            ("status", None) => Ok(Command::Status),
            ("help" | "?", None) => Ok(Command::Help),
            ("quit" | "exit" | "q", None) => Ok(Command::Quit),
            (name, None) => name.parse().map(Command::Toggle),
            _ => Err(OverlayError::InvalidCommand(line.trim().to_string())),
        }
    }
}

//! Line commands read from stdin.
//!
//! The app plays the part of the embedding component: it owns the watched
//! values and turns each command into a runner message.

use fetchkit_core::{Msg, WatchSet, WatchValue};
use thiserror::Error;

pub const HELP: &str = "commands: fetch | set <values...> | touch | activate | deactivate | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Explicit fetch request (the "button click").
    Fetch,
    /// Replace the watched values.
    Set(WatchSet),
    /// A state change that leaves the watched values alone.
    Touch,
    Activate,
    Deactivate,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}; {help}", help = HELP)]
    Unknown(String),
    #[error("{0} takes no arguments")]
    UnexpectedArguments(&'static str),
}

impl Command {
    /// Parses one input line; blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "set" => {
                return Ok(Some(Command::Set(
                    rest.into_iter().map(parse_value).collect(),
                )))
            }
            "fetch" => Command::Fetch,
            "touch" => Command::Touch,
            "activate" => Command::Activate,
            "deactivate" => Command::Deactivate,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        if !rest.is_empty() {
            return Err(CommandError::UnexpectedArguments(command.name()));
        }
        Ok(Some(command))
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Fetch => "fetch",
            Command::Set(_) => "set",
            Command::Touch => "touch",
            Command::Activate => "activate",
            Command::Deactivate => "deactivate",
            Command::Quit => "quit",
        }
    }

    /// Converts to a runner message, updating the owned watch set. `None` for `Quit`.
    pub fn into_msg<T>(self, watch: &mut WatchSet) -> Option<Msg<T>> {
        let msg = match self {
            Command::Fetch => Msg::FetchClicked,
            Command::Set(values) => {
                *watch = values;
                Msg::StateChanged {
                    watch: watch.clone(),
                }
            }
            Command::Touch => Msg::StateChanged {
                watch: watch.clone(),
            },
            Command::Activate => Msg::Activated {
                watch: watch.clone(),
            },
            Command::Deactivate => Msg::Deactivated,
            Command::Quit => return None,
        };
        Some(msg)
    }
}

fn parse_value(word: &str) -> WatchValue {
    match word {
        "true" => WatchValue::Bool(true),
        "false" => WatchValue::Bool(false),
        _ => word
            .parse::<i64>()
            .map(WatchValue::Int)
            .unwrap_or_else(|_| WatchValue::Text(word.to_string())),
    }
}

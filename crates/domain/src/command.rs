//! Command — the short-token text commands accepted from the inbound transport.
//!
//! Parsing is case-insensitive and whitespace-separated. Door references are
//! abbreviations (`i`, `h`, …); the set of valid abbreviations is supplied by
//! the caller so that bare `i` (press the button) and `si` (snooze) can be
//! told apart from unknown words.

use crate::event::{Category, UnknownCategory};

/// Usage text returned for `help` / `?`.
pub const HELP_TEXT: &str = "s | status\n\
<door>  (press the button)\n\
open <door> | close <door>\n\
[un]sub <door> timer|open|close|error|button\n\
list\n\
hist <door> [count]\n\
snooze <door> [minutes] | s<door> [minutes]\n\
help | ?";

/// Words that cannot be used as door abbreviations.
pub const RESERVED_WORDS: &[&str] = &[
    "s", "status", "help", "?", "list", "sub", "unsub", "hist", "snooze", "open", "close",
];

/// A parsed inbound command. Door fields hold the abbreviation as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Help,
    List,
    Subscribe { door: String, category: Category },
    Unsubscribe { door: String, category: Category },
    History { door: String, count: Option<usize> },
    Snooze { door: String, minutes: Option<u64> },
    Open { door: String },
    Close { door: String },
    Press { door: String },
}

/// Why a command could not be parsed or executed. The `Display` text is
/// sent back to the sender.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command. Send ? for help.")]
    Empty,

    #[error("I don't know that command. Sorry.")]
    Unknown(String),

    #[error("Missing {argument} for '{command}'. Send ? for help.")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{value}' is not a valid {argument}.")]
    InvalidNumber {
        argument: &'static str,
        value: String,
    },

    #[error("{0}. Use timer, open, close, error or button.")]
    UnknownCategory(#[from] UnknownCategory),

    #[error("Invalid door name '{0}'.")]
    UnknownDoor(String),
}

impl Command {
    /// Parse `text` given the abbreviations of the configured doors.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing the first problem found.
    pub fn parse(text: &str, doors: &[&str]) -> Result<Self, CommandError> {
        let lowered = text.trim().to_lowercase();
        let mut words = lowered.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = words.collect();

        match head {
            "s" | "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "list" => Ok(Self::List),
            "sub" => {
                let (door, category) = door_and_category("sub", &args)?;
                Ok(Self::Subscribe { door, category })
            }
            "unsub" => {
                let (door, category) = door_and_category("unsub", &args)?;
                Ok(Self::Unsubscribe { door, category })
            }
            "hist" => Ok(Self::History {
                door: required_door("hist", &args)?,
                count: optional_number(args.get(1).copied(), "count")?,
            }),
            "snooze" => Ok(Self::Snooze {
                door: required_door("snooze", &args)?,
                minutes: optional_minutes(args.get(1).copied())?,
            }),
            "open" => Ok(Self::Open {
                door: required_door("open", &args)?,
            }),
            "close" => Ok(Self::Close {
                door: required_door("close", &args)?,
            }),
            other if doors.contains(&other) => Ok(Self::Press {
                door: other.to_string(),
            }),
            other => match other.strip_prefix('s') {
                Some(door) if doors.contains(&door) => Ok(Self::Snooze {
                    door: door.to_string(),
                    minutes: optional_minutes(args.first().copied())?,
                }),
                _ => Err(CommandError::Unknown(other.to_string())),
            },
        }
    }
}

fn required_door(command: &'static str, args: &[&str]) -> Result<String, CommandError> {
    args.first()
        .map(|door| (*door).to_string())
        .ok_or(CommandError::MissingArgument {
            command,
            argument: "door",
        })
}

fn door_and_category(
    command: &'static str,
    args: &[&str],
) -> Result<(String, Category), CommandError> {
    let door = required_door(command, args)?;
    let category = args
        .get(1)
        .ok_or(CommandError::MissingArgument {
            command,
            argument: "event type",
        })?
        .parse()?;
    Ok((door, category))
}

fn optional_number<T: std::str::FromStr>(
    value: Option<&str>,
    argument: &'static str,
) -> Result<Option<T>, CommandError> {
    value
        .map(|raw| {
            raw.parse().map_err(|_| CommandError::InvalidNumber {
                argument,
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn optional_minutes(value: Option<&str>) -> Result<Option<u64>, CommandError> {
    match optional_number::<u64>(value, "number of minutes")? {
        Some(0) => Err(CommandError::InvalidNumber {
            argument: "number of minutes",
            value: "0".to_string(),
        }),
        other => Ok(other),
    }
}

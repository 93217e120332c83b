//! Event types — the closed set of things a door reports to subscribers.
//!
//! Every [`EventType`] carries its own message template, and every
//! [`Category`] (the word users type in `sub`/`unsub` commands) expands to
//! one or more event types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::door::DoorName;
use crate::time::{Timestamp, format_for_message};

/// A notification-worthy occurrence on a single door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Opened,
    Closed,
    StillOpenReminder,
    ToggleConfirmedOpen,
    ToggleConfirmedClosed,
    ToggleFailedOpen,
    ToggleFailedClosed,
}

impl EventType {
    pub const ALL: [Self; 7] = [
        Self::Opened,
        Self::Closed,
        Self::StillOpenReminder,
        Self::ToggleConfirmedOpen,
        Self::ToggleConfirmedClosed,
        Self::ToggleFailedOpen,
        Self::ToggleFailedClosed,
    ];

    /// Render the human-readable message for this event.
    ///
    /// `at` is the time the event refers to: the opening time for
    /// [`Opened`](Self::Opened) and [`StillOpenReminder`](Self::StillOpenReminder),
    /// the observation time otherwise.
    #[must_use]
    pub fn message(self, door: &DoorName, at: &Timestamp) -> String {
        let at = format_for_message(at);
        match self {
            Self::Opened => format!("{door}'s door was opened at {at}"),
            Self::Closed => format!("{door}'s door was closed at {at}"),
            Self::StillOpenReminder => {
                format!("{door}'s door is still open (opened at {at})")
            }
            Self::ToggleConfirmedOpen => format!("{door}'s door opened as requested at {at}"),
            Self::ToggleConfirmedClosed => format!("{door}'s door closed as requested at {at}"),
            Self::ToggleFailedOpen => {
                format!("{door}'s door did not open after pressing the button at {at}")
            }
            Self::ToggleFailedClosed => {
                format!("{door}'s door did not close after pressing the button at {at}")
            }
        }
    }

    /// The subscription category this event belongs to.
    #[must_use]
    pub fn category(self) -> Category {
        match self {
            Self::Opened => Category::Open,
            Self::Closed => Category::Close,
            Self::StillOpenReminder => Category::Timer,
            Self::ToggleConfirmedOpen | Self::ToggleConfirmedClosed => Category::Button,
            Self::ToggleFailedOpen | Self::ToggleFailedClosed => Category::Error,
        }
    }
}

/// User-facing grouping of event types, as typed in `sub`/`unsub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Timer,
    Open,
    Close,
    Error,
    Button,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::Close,
        Self::Timer,
        Self::Button,
        Self::Error,
    ];

    /// The event types a subscription to this category covers.
    #[must_use]
    pub fn event_types(self) -> &'static [EventType] {
        match self {
            Self::Timer => &[EventType::StillOpenReminder],
            Self::Open => &[EventType::Opened],
            Self::Close => &[EventType::Closed],
            Self::Error => &[EventType::ToggleFailedOpen, EventType::ToggleFailedClosed],
            Self::Button => &[
                EventType::ToggleConfirmedOpen,
                EventType::ToggleConfirmedClosed,
            ],
        }
    }

    /// Short description used when listing someone's subscriptions.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Timer => "When door is left open",
            Self::Open => "When door opens",
            Self::Close => "When door closes",
            Self::Error => "If there is an error",
            Self::Button => "Confirmation of open/close",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Self::Timer => "timer",
            Self::Open => "open",
            Self::Close => "close",
            Self::Error => "error",
            Self::Button => "button",
        };
        f.write_str(word)
    }
}

/// Returned when a category word is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timer" => Ok(Self::Timer),
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            "error" => Ok(Self::Error),
            "button" => Ok(Self::Button),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

//! History log — most-recent-first timestamps of open/close events.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::door::DoorName;
use crate::time::{Timestamp, format_for_message};

/// Number of entries returned by a history query when no count is given.
pub const DEFAULT_HISTORY_COUNT: usize = 5;

/// An ordered sequence of timestamps, newest first.
///
/// Storage is unbounded; truncation happens at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(VecDeque<Timestamp>);

impl History {
    /// Insert `at` at the front of the sequence.
    pub fn record(&mut self, at: Timestamp) {
        self.0.push_front(at);
    }

    /// The first `min(count, len)` entries, newest first.
    #[must_use]
    pub fn latest(&self, count: usize) -> Vec<Timestamp> {
        self.0.iter().take(count).copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of an open-history query: the door name header plus entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenHistory {
    pub door: DoorName,
    pub entries: Vec<Timestamp>,
    /// Opens on record before truncation to the requested count.
    pub recorded: usize,
}

impl fmt::Display for OpenHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'s door was opened:", self.door)?;
        if self.recorded == 0 {
            return f.write_str("\n - never");
        }
        for entry in &self.entries {
            write!(f, "\n - {}", format_for_message(entry))?;
        }
        Ok(())
    }
}

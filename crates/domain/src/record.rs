//! Door record — the persisted part of a door (subscriptions and history).

use serde::{Deserialize, Serialize};

use crate::history::History;
use crate::subscription::Subscriptions;
use crate::time::Timestamp;

/// Everything about a door that must survive a restart.
///
/// The in-memory copy owned by the controller is written back to the
/// store after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorRecord {
    pub open_history: History,
    pub close_history: History,
    pub subscriptions: Subscriptions,
}

impl DoorRecord {
    pub fn record_open(&mut self, at: Timestamp) {
        self.open_history.record(at);
    }

    pub fn record_close(&mut self, at: Timestamp) {
        self.close_history.record(at);
    }
}

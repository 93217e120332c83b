//! Subscription registry — who gets notified about which event type.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DoorwatchError, ValidationError};
use crate::event::EventType;

/// Identifier of someone who can receive notifications (e.g. a phone number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Recipient(String);

impl Recipient {
    /// Create a recipient identifier, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRecipient`] when the identifier is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, DoorwatchError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyRecipient.into());
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Recipient {
    type Error = DoorwatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Recipient> for String {
    fn from(value: Recipient) -> Self {
        value.0
    }
}

/// Per-door mapping from [`EventType`] to the set of subscribed recipients.
///
/// Event types with no subscribers are simply absent; lookups treat a
/// missing entry as an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subscriptions(BTreeMap<EventType, BTreeSet<Recipient>>);

impl Subscriptions {
    /// Add `recipient` to `event`. Returns `true` when it was not already present.
    pub fn subscribe(&mut self, event: EventType, recipient: Recipient) -> bool {
        self.0.entry(event).or_default().insert(recipient)
    }

    /// Remove `recipient` from `event`. Returns `true` when it was present.
    ///
    /// An event type whose last recipient is removed is dropped entirely.
    pub fn unsubscribe(&mut self, event: EventType, recipient: &Recipient) -> bool {
        let Some(set) = self.0.get_mut(&event) else {
            return false;
        };
        let removed = set.remove(recipient);
        if set.is_empty() {
            self.0.remove(&event);
        }
        removed
    }

    #[must_use]
    pub fn is_subscribed(&self, event: EventType, recipient: &Recipient) -> bool {
        self.0.get(&event).is_some_and(|set| set.contains(recipient))
    }

    /// Recipients of `event`, in a stable order.
    #[must_use]
    pub fn recipients(&self, event: EventType) -> Vec<Recipient> {
        self.0
            .get(&event)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Event types `recipient` is subscribed to.
    #[must_use]
    pub fn events_for(&self, recipient: &Recipient) -> Vec<EventType> {
        self.0
            .iter()
            .filter(|(_, set)| set.contains(recipient))
            .map(|(event, _)| *event)
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

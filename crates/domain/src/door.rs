//! Door identity, confirmed position and raw sensor readings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DoorwatchError, ValidationError};

/// Stable, human-readable identity of a door (e.g. `"Ivan"`).
///
/// Used as the persistence key and as the handle passed to the sensor and
/// actuator ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoorName(String);

impl DoorName {
    /// Create a door name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDoorName`] when the name is blank.
    pub fn new(name: impl Into<String>) -> Result<Self, DoorwatchError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyDoorName.into());
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DoorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DoorName {
    type Error = DoorwatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DoorName> for String {
    fn from(value: DoorName) -> Self {
        value.0
    }
}

/// The debounced, trusted position of a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
}

impl DoorState {
    /// The position a successful press of the button moves the door to.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// A single, un-debounced sample of the position sensor.
///
/// Sensor failures are represented as [`Unknown`](Self::Unknown) rather
/// than as errors; callers treat an unknown reading as "do nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorReading {
    Open,
    Closed,
    Unknown,
}

impl SensorReading {
    /// The door position this reading indicates, if known.
    #[must_use]
    pub fn state(self) -> Option<DoorState> {
        match self {
            Self::Open => Some(DoorState::Open),
            Self::Closed => Some(DoorState::Closed),
            Self::Unknown => None,
        }
    }
}

impl From<DoorState> for SensorReading {
    fn from(value: DoorState) -> Self {
        match value {
            DoorState::Open => Self::Open,
            DoorState::Closed => Self::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_trim_door_name() {
        let name = DoorName::new("  Ivan ").unwrap();
        assert_eq!(name.as_str(), "Ivan");
    }

    #[test]
    fn should_reject_blank_door_name() {
        let result = DoorName::new("   ");
        assert!(matches!(
            result,
            Err(DoorwatchError::Validation(ValidationError::EmptyDoorName))
        ));
    }

    #[test]
    fn should_reject_blank_door_name_when_deserializing() {
        let result: Result<DoorName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn should_toggle_state() {
        assert_eq!(DoorState::Open.toggled(), DoorState::Closed);
        assert_eq!(DoorState::Closed.toggled(), DoorState::Open);
    }

    #[test]
    fn should_map_unknown_reading_to_no_state() {
        assert_eq!(SensorReading::Unknown.state(), None);
        assert_eq!(SensorReading::Open.state(), Some(DoorState::Open));
        assert_eq!(
            SensorReading::from(DoorState::Closed),
            SensorReading::Closed
        );
    }

    #[test]
    fn should_display_lowercase_state() {
        assert_eq!(DoorState::Open.to_string(), "open");
        assert_eq!(DoorState::Closed.to_string(), "closed");
    }
}

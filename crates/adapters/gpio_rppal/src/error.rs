//! GPIO adapter error types.

use doorwatch_domain::door::DoorName;
use doorwatch_domain::error::DoorwatchError;

/// Errors specific to the GPIO adapter.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// The GPIO peripheral or a pin could not be claimed.
    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    /// `open_level` must be `0` or `1`.
    #[error("open level must be 0 or 1, got {0}")]
    InvalidOpenLevel(u8),

    /// Two doors, or a door's sensor and actuator, share one GPIO line.
    #[error("GPIO {0} is assigned more than once")]
    PinInUse(u8),

    /// No lines are wired for this door.
    #[error("no GPIO lines configured for door {0}")]
    UnknownDoor(DoorName),
}

impl From<GpioError> for DoorwatchError {
    fn from(err: GpioError) -> Self {
        Self::Hardware(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_the_door_without_lines() {
        let err = GpioError::UnknownDoor(DoorName::new("Ivan").unwrap());
        assert_eq!(err.to_string(), "no GPIO lines configured for door Ivan");
    }

    #[test]
    fn should_convert_to_hardware_error() {
        let err: DoorwatchError = GpioError::PinInUse(18).into();
        assert!(matches!(err, DoorwatchError::Hardware(_)));
    }
}

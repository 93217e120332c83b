//! GPIO adapter configuration.

use serde::Deserialize;

/// How the relays and sensors behave.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// How long the button relay is held, in milliseconds.
    pub pulse_millis: u64,
    /// Sensor level (`0` or `1`) that means the door is open.
    pub open_level: u8,
    /// Enable the internal pull-up on sensor inputs.
    pub pull_up: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            pulse_millis: 1000,
            open_level: 0,
            pull_up: true,
        }
    }
}

/// BCM GPIO numbers wired to one door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DoorPins {
    /// Input connected to the reed switch.
    pub sensor: u8,
    /// Output driving the button relay (active low).
    pub actuator: u8,
}

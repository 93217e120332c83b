//! The two kinds of line a door uses, implemented for `rppal` pins.

use rppal::gpio::{InputPin, Level, OutputPin};

/// Input sampled for the door position.
pub trait SensorLine: Send + 'static {
    fn level(&self) -> Level;
}

/// Output driving a button relay.
pub trait RelayLine: Send + 'static {
    fn drive(&mut self, level: Level);
}

impl SensorLine for InputPin {
    fn level(&self) -> Level {
        self.read()
    }
}

impl RelayLine for OutputPin {
    fn drive(&mut self, level: Level) {
        self.write(level);
    }
}

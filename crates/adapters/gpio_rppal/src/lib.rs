//! # doorwatch-adapter-gpio-rppal
//!
//! Door hardware on the Raspberry Pi GPIO header, driven through `rppal`.
//!
//! ## Wiring
//!
//! | Line | Direction | Meaning |
//! |------|-----------|---------|
//! | sensor | in | reed switch; `open_level` means open |
//! | actuator | out | button relay, active low: low presses, high releases |
//!
//! A pulse drives the relay low, holds for `pulse_millis`, then releases it.
//! The release happens when the pulse completes or is dropped, whichever
//! comes first. Relay pins return to their previous mode when the adapter is
//! dropped.
//!
//! Sensor inputs can raise an interrupt on either edge; see
//! [`RppalDoors::notify_edges`].
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `doorwatch-app` and `doorwatch-domain`.

mod config;
mod error;
mod lines;

pub use config::{DoorPins, GpioConfig};
pub use error::GpioError;
pub use lines::{RelayLine, SensorLine};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use tokio::sync::Notify;

use doorwatch_app::ports::{DoorActuator, DoorSensor};
use doorwatch_domain::door::{DoorName, SensorReading};

/// Sensors and button relays of every door.
pub struct GpioDoors<I, O> {
    config: GpioConfig,
    open: Level,
    doors: HashMap<DoorName, DoorLines<I, O>>,
}

/// The doors on the Pi's own GPIO header.
pub type RppalDoors = GpioDoors<InputPin, OutputPin>;

struct DoorLines<I, O> {
    sensor: Mutex<I>,
    relay: Arc<Mutex<O>>,
}

impl RppalDoors {
    /// Claim every configured pin. Relays start released.
    ///
    /// # Errors
    ///
    /// Returns [`GpioError::PinInUse`] or [`GpioError::InvalidOpenLevel`] for
    /// an inconsistent configuration, and [`GpioError::Gpio`] when the
    /// peripheral or a pin cannot be claimed.
    pub fn open(config: GpioConfig, pins: HashMap<DoorName, DoorPins>) -> Result<Self, GpioError> {
        check_pins(&pins)?;
        let gpio = Gpio::new()?;
        let mut lines = HashMap::with_capacity(pins.len());
        for (door, pins) in pins {
            let sensor = gpio.get(pins.sensor)?;
            let sensor = if config.pull_up {
                sensor.into_input_pullup()
            } else {
                sensor.into_input()
            };
            let relay = gpio.get(pins.actuator)?.into_output_high();
            tracing::info!(door = %door, sensor = pins.sensor, actuator = pins.actuator, "GPIO lines ready");
            lines.insert(door, (sensor, relay));
        }
        Self::with_lines(config, lines)
    }

    /// Notify `edges` on every level change of `door`'s sensor.
    ///
    /// # Errors
    ///
    /// Returns [`GpioError::UnknownDoor`] if `door` has no lines, and
    /// [`GpioError::Gpio`] if the interrupt cannot be registered.
    pub fn notify_edges(&self, door: &DoorName, edges: Arc<Notify>) -> Result<(), GpioError> {
        let lines = self
            .doors
            .get(door)
            .ok_or_else(|| GpioError::UnknownDoor(door.clone()))?;
        lock(&lines.sensor).set_async_interrupt(Trigger::Both, None, move |_| {
            edges.notify_one();
        })?;
        tracing::debug!(door = %door, "sensor interrupt registered");
        Ok(())
    }
}

impl<I: SensorLine, O: RelayLine> GpioDoors<I, O> {
    /// Build from already-configured lines, one sensor and one relay per door.
    ///
    /// # Errors
    ///
    /// Returns [`GpioError::InvalidOpenLevel`] if `open_level` is not `0` or `1`.
    pub fn with_lines(
        config: GpioConfig,
        lines: HashMap<DoorName, (I, O)>,
    ) -> Result<Self, GpioError> {
        let open = match config.open_level {
            0 => Level::Low,
            1 => Level::High,
            other => return Err(GpioError::InvalidOpenLevel(other)),
        };
        let doors = lines
            .into_iter()
            .map(|(door, (sensor, relay))| {
                let lines = DoorLines {
                    sensor: Mutex::new(sensor),
                    relay: Arc::new(Mutex::new(relay)),
                };
                (door, lines)
            })
            .collect();
        Ok(Self {
            config,
            open,
            doors,
        })
    }

    /// Doors with wired lines.
    pub fn doors(&self) -> impl Iterator<Item = &DoorName> {
        self.doors.keys()
    }
}

impl<I: SensorLine, O: RelayLine> DoorSensor for GpioDoors<I, O> {
    fn read(&self, door: &DoorName) -> impl Future<Output = SensorReading> + Send {
        let reading = match self.doors.get(door) {
            Some(lines) if lock(&lines.sensor).level() == self.open => SensorReading::Open,
            Some(_) => SensorReading::Closed,
            None => {
                tracing::warn!(door = %door, "no GPIO lines configured for door");
                SensorReading::Unknown
            }
        };
        async move { reading }
    }
}

impl<I: SensorLine, O: RelayLine> DoorActuator for GpioDoors<I, O> {
    fn pulse(&self, door: &DoorName) -> impl Future<Output = ()> + Send {
        let relay = self.doors.get(door).map(|lines| Arc::clone(&lines.relay));
        let hold = Duration::from_millis(self.config.pulse_millis);
        let door = door.clone();
        async move {
            let Some(relay) = relay else {
                tracing::warn!(door = %door, "no GPIO lines configured for door");
                return;
            };
            let _pressed = Pressed::new(relay);
            tracing::debug!(door = %door, hold_millis = hold.as_millis(), "button relay pressed");
            tokio::time::sleep(hold).await;
        }
    }
}

/// A relay held low until this is dropped.
struct Pressed<O: RelayLine>(Arc<Mutex<O>>);

impl<O: RelayLine> Pressed<O> {
    fn new(relay: Arc<Mutex<O>>) -> Self {
        lock(&relay).drive(Level::Low);
        Self(relay)
    }
}

impl<O: RelayLine> Drop for Pressed<O> {
    fn drop(&mut self) {
        lock(&self.0).drive(Level::High);
    }
}

fn lock<T>(line: &Mutex<T>) -> MutexGuard<'_, T> {
    line.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_pins(doors: &HashMap<DoorName, DoorPins>) -> Result<(), GpioError> {
    let mut used = HashSet::new();
    for pins in doors.values() {
        for pin in [pins.sensor, pins.actuator] {
            if !used.insert(pin) {
                return Err(GpioError::PinInUse(pin));
            }
        }
    }
    Ok(())
}

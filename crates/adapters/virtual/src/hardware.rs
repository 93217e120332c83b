//! Simulated door hardware.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use doorwatch_app::ports::{DoorActuator, DoorSensor};
use doorwatch_domain::door::{DoorName, DoorState, SensorReading};

#[derive(Debug, Clone, Copy)]
struct VirtualDoor {
    position: DoorState,
    jammed: bool,
    unreadable: bool,
    pulses: usize,
}

/// Sensors and buttons for any number of simulated doors.
///
/// Doors that were never [`add`](Self::add)ed read as
/// [`SensorReading::Unknown`] and ignore pulses.
#[derive(Debug, Default)]
pub struct VirtualDoorHardware {
    doors: Mutex<HashMap<DoorName, VirtualDoor>>,
}

impl VirtualDoorHardware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a door in the given position.
    pub fn add(&self, door: DoorName, position: DoorState) {
        self.lock().insert(
            door,
            VirtualDoor {
                position,
                jammed: false,
                unreadable: false,
                pulses: 0,
            },
        );
    }

    /// Move the door by hand, without pressing the button.
    pub fn set_position(&self, door: &DoorName, position: DoorState) {
        self.update(door, |d| d.position = position);
    }

    /// A jammed door ignores button presses.
    pub fn set_jammed(&self, door: &DoorName, jammed: bool) {
        self.update(door, |d| d.jammed = jammed);
    }

    /// An unreadable door reports [`SensorReading::Unknown`].
    pub fn set_unreadable(&self, door: &DoorName, unreadable: bool) {
        self.update(door, |d| d.unreadable = unreadable);
    }

    #[must_use]
    pub fn position(&self, door: &DoorName) -> Option<DoorState> {
        self.lock().get(door).map(|d| d.position)
    }

    /// How many times the button of `door` was pressed.
    #[must_use]
    pub fn pulses(&self, door: &DoorName) -> usize {
        self.lock().get(door).map_or(0, |d| d.pulses)
    }

    fn update(&self, door: &DoorName, f: impl FnOnce(&mut VirtualDoor)) {
        match self.lock().get_mut(door) {
            Some(state) => f(state),
            None => tracing::warn!(door = %door, "unknown virtual door"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DoorName, VirtualDoor>> {
        self.doors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DoorSensor for VirtualDoorHardware {
    fn read(&self, door: &DoorName) -> impl Future<Output = SensorReading> + Send {
        let reading = match self.lock().get(door) {
            Some(d) if d.unreadable => SensorReading::Unknown,
            Some(d) => d.position.into(),
            None => SensorReading::Unknown,
        };
        async move { reading }
    }
}

impl DoorActuator for VirtualDoorHardware {
    fn pulse(&self, door: &DoorName) -> impl Future<Output = ()> + Send {
        self.update(door, |d| {
            d.pulses += 1;
            if d.jammed {
                tracing::info!(door = %door, "virtual door is jammed, not moving");
            } else {
                d.position = d.position.toggled();
                tracing::info!(door = %door, position = %d.position, "virtual door moved");
            }
        });
        async {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ivan() -> DoorName {
        DoorName::new("Ivan").unwrap()
    }

    fn hardware() -> VirtualDoorHardware {
        let hardware = VirtualDoorHardware::new();
        hardware.add(ivan(), DoorState::Closed);
        hardware
    }

    #[tokio::test]
    async fn should_read_current_position() {
        let hw = hardware();
        assert_eq!(hw.read(&ivan()).await, SensorReading::Closed);

        hw.set_position(&ivan(), DoorState::Open);
        assert_eq!(hw.read(&ivan()).await, SensorReading::Open);
    }

    #[tokio::test]
    async fn should_toggle_on_pulse() {
        let hw = hardware();
        hw.pulse(&ivan()).await;
        assert_eq!(hw.position(&ivan()), Some(DoorState::Open));
        hw.pulse(&ivan()).await;
        assert_eq!(hw.position(&ivan()), Some(DoorState::Closed));
        assert_eq!(hw.pulses(&ivan()), 2);
    }

    #[tokio::test]
    async fn should_not_move_when_jammed() {
        let hw = hardware();
        hw.set_jammed(&ivan(), true);
        hw.pulse(&ivan()).await;
        assert_eq!(hw.position(&ivan()), Some(DoorState::Closed));
        assert_eq!(hw.pulses(&ivan()), 1);
    }

    #[tokio::test]
    async fn should_read_unknown_when_unreadable_or_unregistered() {
        let hw = hardware();
        hw.set_unreadable(&ivan(), true);
        assert_eq!(hw.read(&ivan()).await, SensorReading::Unknown);

        let other = DoorName::new("Heather").unwrap();
        assert_eq!(hw.read(&other).await, SensorReading::Unknown);
        hw.pulse(&other).await;
        assert_eq!(hw.pulses(&other), 0);
    }
}

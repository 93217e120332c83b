//! Hardware ports — the position sensor and the momentary actuator of a door.
//!
//! Both are addressed by [`DoorName`], so one adapter instance can serve every
//! door sharing the same bus. Callers serialize access through the
//! [`HardwareBus`](crate::bus::HardwareBus); implementations need not.

use std::future::Future;
use std::sync::Arc;

use doorwatch_domain::door::{DoorName, SensorReading};

/// Reads the current, un-debounced position of a door.
pub trait DoorSensor: Send + Sync {
    /// Sample the sensor once.
    ///
    /// Must be cheap and repeatable. Failures are reported as
    /// [`SensorReading::Unknown`], never as a panic.
    fn read(&self, door: &DoorName) -> impl Future<Output = SensorReading> + Send;
}

/// Presses the door's button: assert the output, hold briefly, release.
pub trait DoorActuator: Send + Sync {
    /// Fire-and-forget pulse. Whether the door actually moved is verified by
    /// the controller re-sampling the sensor.
    fn pulse(&self, door: &DoorName) -> impl Future<Output = ()> + Send;
}

impl<T: DoorSensor> DoorSensor for Arc<T> {
    fn read(&self, door: &DoorName) -> impl Future<Output = SensorReading> + Send {
        (**self).read(door)
    }
}

impl<T: DoorActuator> DoorActuator for Arc<T> {
    fn pulse(&self, door: &DoorName) -> impl Future<Output = ()> + Send {
        (**self).pulse(door)
    }
}

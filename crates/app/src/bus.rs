//! Shared hardware bus — the single lock serializing sensor reads, actuator
//! pulses and confirmed-state transitions across every door in the process.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// Cloneable handle to the process-wide hardware lock.
///
/// Construct one at startup and hand a clone to every
/// [`DoorController`](crate::door_controller::DoorController). The guard is
/// released on every exit path when it goes out of scope.
#[derive(Debug, Clone, Default)]
pub struct HardwareBus {
    lock: Arc<Mutex<()>>,
}

impl HardwareBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the bus.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_share_one_lock_between_clones() {
        let bus = HardwareBus::new();
        let other = bus.clone();

        let guard = bus.acquire().await;
        assert!(other.lock.try_lock().is_err());
        drop(guard);
        assert!(other.lock.try_lock().is_ok());
    }
}

//! Sensor watch — turns a polled sensor into a stream of edge interrupts.
//!
//! Each tick samples the raw reading under the hardware bus. A known reading
//! that disagrees with the confirmed state starts a debounce cycle on the
//! controller in its own task, so a slow settle never delays polling. While a
//! cycle is in flight no second one is started; once it finishes, a reading
//! that still disagrees starts another.
//!
//! A hardware interrupt can wake the watch early through [`SensorWatch::wake_on`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::door_controller::{DoorController, EdgeOutcome};
use crate::ports::{DoorActuator, DoorRepository, DoorSensor, Notifier};

/// Polls one door's sensor and feeds edges to its controller.
pub struct SensorWatch<S, A, N, R> {
    controller: DoorController<S, A, N, R>,
    interval: Duration,
    edges: Arc<Notify>,
}

impl<S, A, N, R> SensorWatch<S, A, N, R>
where
    S: DoorSensor + 'static,
    A: DoorActuator + 'static,
    N: Notifier + 'static,
    R: DoorRepository + 'static,
{
    #[must_use]
    pub fn new(controller: DoorController<S, A, N, R>, interval: Duration) -> Self {
        Self {
            controller,
            interval,
            edges: Arc::new(Notify::new()),
        }
    }

    /// Also sample whenever `edges` is notified, ahead of the next tick.
    /// The notifier may be fired from a non-async interrupt thread.
    #[must_use]
    pub fn wake_on(mut self, edges: Arc<Notify>) -> Self {
        self.edges = edges;
        self
    }

    /// Poll forever. Abort the task running this to stop it.
    #[tracing::instrument(skip(self), fields(door = %self.controller.name()))]
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle: Option<JoinHandle<EdgeOutcome>> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = self.edges.notified() => tracing::trace!("woken by sensor interrupt"),
            }
            let reading = self.controller.read_sensor().await;
            let Some(seen) = reading.state() else {
                tracing::trace!("sensor unreadable, skipping sample");
                continue;
            };
            if cycle.as_ref().is_some_and(|task| !task.is_finished()) {
                continue;
            }
            let confirmed = self.controller.confirmed_state().await;
            if seen == confirmed {
                continue;
            }
            tracing::debug!(confirmed = ?confirmed, raw = ?reading, "sensor disagrees with confirmed state");
            let controller = self.controller.clone();
            cycle = Some(tokio::spawn(
                async move { controller.handle_sensor_edge().await },
            ));
        }
    }
}

//! Nightly open-door check.
//!
//! Once a day, at a fixed local time, every door that reads open reminds
//! its timer subscribers. The check runs independently of each door's
//! reminder timer.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};

use crate::door_controller::DoorController;
use crate::ports::{DoorActuator, DoorRepository, DoorSensor, Notifier};

/// Time left from `now` until the next occurrence of `at` on the wall clock
/// of `now`'s time zone. An `at` equal to `now` is a full day away.
#[must_use]
pub fn delay_until_next<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Duration {
    let local = now.naive_local();
    let mut next = local.date().and_time(at);
    if next <= local {
        next += TimeDelta::days(1);
    }
    (next - local).to_std().unwrap_or_default()
}

/// Runs [`DoorController::nightly_check`] on every door at `at` each day.
pub struct NightlyCheck<S, A, N, R> {
    doors: Vec<DoorController<S, A, N, R>>,
    at: NaiveTime,
}

impl<S, A, N, R> NightlyCheck<S, A, N, R>
where
    S: DoorSensor + 'static,
    A: DoorActuator + 'static,
    N: Notifier + 'static,
    R: DoorRepository + 'static,
{
    #[must_use]
    pub fn new(doors: Vec<DoorController<S, A, N, R>>, at: NaiveTime) -> Self {
        Self { doors, at }
    }

    /// Check every door once. Returns how many were open.
    pub async fn check_all(&self) -> usize {
        let mut open = 0;
        for door in &self.doors {
            if door.nightly_check().await {
                open += 1;
            }
        }
        open
    }

    /// Sleep until the configured time, check, repeat. Abort the task
    /// running this to stop it.
    #[tracing::instrument(skip(self), fields(at = %self.at))]
    pub async fn run(self) {
        loop {
            let delay = delay_until_next(&Local::now(), self.at);
            tracing::debug!(delay_secs = delay.as_secs(), "next nightly check scheduled");
            tokio::time::sleep(delay).await;
            let open = self.check_all().await;
            tracing::info!(open, "nightly check done");
        }
    }
}

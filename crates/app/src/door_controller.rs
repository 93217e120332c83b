//! Door controller — the per-door state machine.
//!
//! One controller owns one door: its confirmed state, its single active
//! timer, its subscriptions and its history. Three kinds of activity drive
//! it concurrently:
//!
//! - sensor edges ([`handle_sensor_edge`](DoorController::handle_sensor_edge)),
//!   debounced by a settle wait before the sensor is trusted;
//! - commands (open/close/press, subscribe, snooze, history, status);
//! - timer firings (quiet time, reminders, snoozes), delivered by the
//!   controller's own [`TimerScheduler`].
//!
//! Every sensor read, actuator pulse and state transition happens while
//! holding the shared [`HardwareBus`]. Long waits (settle, transition) are
//! spent *without* the bus. Notifications are sent after all locks are
//! released.
//!
//! ```text
//!              edge + settle, sensor = Open
//!   Closed ────────────────────────────────► Open ──► arm quiet timer
//!     ▲                                        │
//!     │  edge + settle, sensor = Closed        │ timer fires, still open
//!     └──────── cancel timer ◄─────────────────┤──► reminder, arm repeat timer
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use doorwatch_domain::door::{DoorName, DoorState, SensorReading};
use doorwatch_domain::error::DoorwatchError;
use doorwatch_domain::event::EventType;
use doorwatch_domain::history::{DEFAULT_HISTORY_COUNT, OpenHistory};
use doorwatch_domain::record::DoorRecord;
use doorwatch_domain::subscription::Recipient;
use doorwatch_domain::time::{self, Timestamp};

use crate::bus::HardwareBus;
use crate::ports::{DoorActuator, DoorRepository, DoorSensor, Notifier};
use crate::scheduler::{Fired, TimerHandle, TimerScheduler};

/// Fixed delays used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorTimings {
    /// Wait after a raw sensor edge before sampling.
    pub settle: Duration,
    /// Wait after pressing the button before checking the result.
    pub transition: Duration,
    /// Delay between an open event and the first reminder.
    pub quiet: Duration,
    /// Delay between successive reminders.
    pub reminder: Duration,
}

impl Default for DoorTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(20),
            transition: Duration::from_secs(30),
            quiet: Duration::from_secs(300),
            reminder: Duration::from_secs(1800),
        }
    }
}

/// The adapters a controller talks to.
pub struct DoorPorts<S, A, N, R> {
    pub sensor: S,
    pub actuator: A,
    pub notifier: N,
    pub repository: R,
}

/// Result of a debounced sensor edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The reading differed from the confirmed state and was committed.
    Transitioned(DoorState),
    /// The reading matched the confirmed state.
    FalseAlarm,
    /// The sensor could not be read after settling.
    SensorUnavailable,
}

/// Result of pressing the door button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The door was already in the requested position; nothing was pressed.
    NotNeeded,
    /// The button was pressed and the result judged; the event was sent to
    /// its subscribers.
    Completed(EventType),
    /// The button was pressed but the sensor could not be read afterwards.
    SensorUnavailable,
}

/// Snapshot returned by [`DoorController::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorStatus {
    pub name: DoorName,
    pub state: DoorState,
    pub last_opened_at: Option<Timestamp>,
    pub timer_armed: bool,
    /// A save to the repository failed; the in-memory record is ahead of
    /// the persisted one.
    pub durability_degraded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Quiet,
    Reminder,
    Snooze,
}

struct ArmedTimer {
    handle: TimerHandle,
    kind: TimerKind,
}

struct DoorData {
    confirmed: DoorState,
    last_opened_at: Option<Timestamp>,
    timer: Option<ArmedTimer>,
    record: DoorRecord,
    durability_degraded: bool,
}

struct Outgoing {
    event: EventType,
    message: String,
    recipients: Vec<Recipient>,
}

struct Inner<S, A, N, R> {
    name: DoorName,
    ports: DoorPorts<S, A, N, R>,
    bus: HardwareBus,
    timings: DoorTimings,
    scheduler: TimerScheduler<TimerKind>,
    data: Mutex<DoorData>,
    /// Held for a whole debounce cycle so cycles on one door never overlap.
    debounce: Mutex<()>,
}

/// Cheaply cloneable handle to a running door controller.
pub struct DoorController<S, A, N, R> {
    inner: Arc<Inner<S, A, N, R>>,
}

impl<S, A, N, R> Clone for DoorController<S, A, N, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, N, R> DoorController<S, A, N, R>
where
    S: DoorSensor + 'static,
    A: DoorActuator + 'static,
    N: Notifier + 'static,
    R: DoorRepository + 'static,
{
    /// Load the persisted record, read the initial position and start
    /// listening for timer firings.
    ///
    /// A door with no persisted record starts with empty subscriptions and
    /// history. An unreadable sensor at startup is treated as `Closed`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the record cannot be loaded.
    #[tracing::instrument(skip_all, fields(door = %name))]
    pub async fn start(
        name: DoorName,
        ports: DoorPorts<S, A, N, R>,
        bus: HardwareBus,
        timings: DoorTimings,
    ) -> Result<Self, DoorwatchError> {
        let record = match ports.repository.load(&name).await? {
            Some(record) => record,
            None => {
                tracing::info!("no persisted record, starting empty");
                DoorRecord::default()
            }
        };

        let reading = {
            let _bus = bus.acquire().await;
            ports.sensor.read(&name).await
        };
        let confirmed = reading.state().unwrap_or_else(|| {
            tracing::warn!("sensor unreadable at startup, assuming closed");
            DoorState::Closed
        });

        let (scheduler, fired_rx) = TimerScheduler::new();
        let inner = Arc::new(Inner {
            name,
            ports,
            bus,
            timings,
            scheduler,
            data: Mutex::new(DoorData {
                confirmed,
                last_opened_at: None,
                timer: None,
                record,
                durability_degraded: false,
            }),
            debounce: Mutex::new(()),
        });
        tokio::spawn(dispatch_timers(Arc::downgrade(&inner), fired_rx));

        tracing::info!(state = %confirmed, "door controller started");
        Ok(Self { inner })
    }

    #[must_use]
    pub fn name(&self) -> &DoorName {
        &self.inner.name
    }

    /// Debounce a raw sensor edge: wait for the door to settle, sample once,
    /// and commit a transition if the reading differs from the confirmed
    /// state.
    #[tracing::instrument(skip(self), fields(door = %self.inner.name))]
    pub async fn handle_sensor_edge(&self) -> EdgeOutcome {
        let inner = &self.inner;
        let _cycle = inner.debounce.lock().await;
        tracing::debug!(
            settle_secs = inner.timings.settle.as_secs(),
            "sensor edge, waiting for door to settle"
        );
        tokio::time::sleep(inner.timings.settle).await;

        let (outcome, outgoing) = {
            let _bus = inner.bus.acquire().await;
            let reading = inner.ports.sensor.read(&inner.name).await;
            let Some(observed) = reading.state() else {
                tracing::warn!("sensor unreadable after settling, ignoring edge");
                return EdgeOutcome::SensorUnavailable;
            };
            let mut data = inner.data.lock().await;
            if observed == data.confirmed {
                tracing::debug!(state = %observed, "false alarm, nothing changed");
                return EdgeOutcome::FalseAlarm;
            }
            let outgoing = self.commit(&mut data, observed).await;
            (EdgeOutcome::Transitioned(observed), outgoing)
        };

        self.dispatch(outgoing).await;
        outcome
    }

    /// Press the button only if the door is currently closed.
    pub async fn open(&self) -> ToggleOutcome {
        self.press_button(Some(DoorState::Closed)).await
    }

    /// Press the button only if the door is currently open.
    pub async fn close(&self) -> ToggleOutcome {
        self.press_button(Some(DoorState::Open)).await
    }

    /// Press the button regardless of the current position.
    pub async fn press(&self) -> ToggleOutcome {
        self.press_button(None).await
    }

    /// Cancel the pending reminder. With a delay, check again once it
    /// elapses; without one, stay silent until the door next opens.
    #[tracing::instrument(skip(self), fields(door = %self.inner.name))]
    pub async fn snooze(&self, delay: Option<Duration>) {
        let _bus = self.inner.bus.acquire().await;
        let mut data = self.inner.data.lock().await;
        match delay {
            Some(delay) => self.arm(&mut data, TimerKind::Snooze, delay),
            None => {
                cancel_timer(&mut data);
                tracing::info!("reminders silenced until the door next opens");
            }
        }
    }

    /// Subscribe `recipient` to `event`. Returns `true` if it was added.
    #[tracing::instrument(skip(self), fields(door = %self.inner.name))]
    pub async fn subscribe(&self, event: EventType, recipient: Recipient) -> bool {
        let mut data = self.inner.data.lock().await;
        let added = data.record.subscriptions.subscribe(event, recipient);
        if added {
            self.persist(&mut data).await;
        }
        added
    }

    /// Unsubscribe `recipient` from `event`. Returns `true` if it was removed.
    #[tracing::instrument(skip(self), fields(door = %self.inner.name))]
    pub async fn unsubscribe(&self, event: EventType, recipient: &Recipient) -> bool {
        let mut data = self.inner.data.lock().await;
        let removed = data.record.subscriptions.unsubscribe(event, recipient);
        if removed {
            self.persist(&mut data).await;
        }
        removed
    }

    pub async fn is_subscribed(&self, event: EventType, recipient: &Recipient) -> bool {
        let data = self.inner.data.lock().await;
        data.record.subscriptions.is_subscribed(event, recipient)
    }

    /// Event types `recipient` is subscribed to on this door.
    pub async fn subscriptions_for(&self, recipient: &Recipient) -> Vec<EventType> {
        let data = self.inner.data.lock().await;
        data.record.subscriptions.events_for(recipient)
    }

    /// The latest `count` (default [`DEFAULT_HISTORY_COUNT`]) open times,
    /// newest first.
    pub async fn open_history(&self, count: Option<usize>) -> OpenHistory {
        let data = self.inner.data.lock().await;
        let history = &data.record.open_history;
        OpenHistory {
            door: self.inner.name.clone(),
            entries: history.latest(count.unwrap_or(DEFAULT_HISTORY_COUNT)),
            recorded: history.len(),
        }
    }

    /// The latest `count` close times, newest first.
    pub async fn close_history(&self, count: usize) -> Vec<Timestamp> {
        let data = self.inner.data.lock().await;
        data.record.close_history.latest(count)
    }

    pub async fn status(&self) -> DoorStatus {
        let data = self.inner.data.lock().await;
        DoorStatus {
            name: self.inner.name.clone(),
            state: data.confirmed,
            last_opened_at: data.last_opened_at,
            timer_armed: data.timer.is_some(),
            durability_degraded: data.durability_degraded,
        }
    }

    pub async fn confirmed_state(&self) -> DoorState {
        self.inner.data.lock().await.confirmed
    }

    /// Sample the raw sensor under the bus, without debouncing.
    pub async fn read_sensor(&self) -> SensorReading {
        let _bus = self.inner.bus.acquire().await;
        self.inner.ports.sensor.read(&self.inner.name).await
    }

    /// Remind timer subscribers if the door is open right now. Does not
    /// touch the reminder timer. Returns whether a reminder was due.
    #[tracing::instrument(skip(self), fields(door = %self.inner.name))]
    pub async fn nightly_check(&self) -> bool {
        if self.read_sensor().await != SensorReading::Open {
            tracing::debug!("nightly check: door is not open");
            return false;
        }
        let outgoing = {
            let data = self.inner.data.lock().await;
            let opened_at = data.last_opened_at.unwrap_or_else(time::now);
            self.outgoing(&data, EventType::StillOpenReminder, opened_at)
        };
        tracing::info!("nightly check: door is open");
        self.dispatch(outgoing).await;
        true
    }

    /// Pulse, wait for the mechanism, re-sample and judge the result.
    #[tracing::instrument(skip(self), fields(door = %self.inner.name))]
    async fn press_button(&self, required: Option<DoorState>) -> ToggleOutcome {
        let inner = &self.inner;
        let begin = {
            let _bus = inner.bus.acquire().await;
            let begin = inner.data.lock().await.confirmed;
            if required.is_some_and(|required| required != begin) {
                tracing::info!(state = %begin, "door already in requested position");
                return ToggleOutcome::NotNeeded;
            }
            tracing::info!(state = %begin, "pressing door button");
            inner.ports.actuator.pulse(&inner.name).await;
            begin
        };

        tokio::time::sleep(inner.timings.transition).await;

        let (event, outgoing) = {
            let _bus = inner.bus.acquire().await;
            let reading = inner.ports.sensor.read(&inner.name).await;
            let Some(end) = reading.state() else {
                tracing::warn!("sensor unreadable after pressing button, outcome unknown");
                return ToggleOutcome::SensorUnavailable;
            };
            let mut data = inner.data.lock().await;
            let mut outgoing = Vec::new();
            if end != data.confirmed {
                outgoing.extend(self.commit(&mut data, end).await);
            }
            let event = toggle_result(begin, end);
            if matches!(
                event,
                EventType::ToggleFailedOpen | EventType::ToggleFailedClosed
            ) {
                tracing::warn!(?event, state = %end, "door did not move after pressing button");
            } else {
                tracing::info!(?event, state = %end, "door moved as requested");
            }
            outgoing.extend(self.outgoing(&data, event, time::now()));
            (event, outgoing)
        };

        self.dispatch(outgoing).await;
        ToggleOutcome::Completed(event)
    }

    /// Apply a confirmed transition. Caller holds the bus.
    async fn commit(&self, data: &mut DoorData, observed: DoorState) -> Option<Outgoing> {
        let now = time::now();
        data.confirmed = observed;
        match observed {
            DoorState::Open => {
                if let Some(stale) = data.timer.take() {
                    tracing::warn!(kind = ?stale.kind, "timer still armed when door opened, cancelling it");
                    stale.handle.cancel();
                }
                data.last_opened_at = Some(now);
                data.record.record_open(now);
                self.persist(data).await;
                self.arm(data, TimerKind::Quiet, self.inner.timings.quiet);
                tracing::info!("door opened");
                self.outgoing(data, EventType::Opened, now)
            }
            DoorState::Closed => {
                cancel_timer(data);
                data.record.record_close(now);
                self.persist(data).await;
                tracing::info!("door closed");
                self.outgoing(data, EventType::Closed, now)
            }
        }
    }

    /// React to a timer firing: re-check the live position and either
    /// remind (and re-arm) or go quiet.
    #[tracing::instrument(skip(self, fired), fields(door = %self.inner.name))]
    async fn on_timer(&self, fired: Fired<TimerKind>) {
        let inner = &self.inner;
        let outgoing = {
            let _bus = inner.bus.acquire().await;
            let mut data = inner.data.lock().await;
            if data.timer.as_ref().map(|t| t.handle.id()) != Some(fired.id) {
                tracing::debug!(kind = ?fired.payload, "ignoring cancelled timer");
                return;
            }
            data.timer = None;

            match inner.ports.sensor.read(&inner.name).await.state() {
                Some(DoorState::Open) => {
                    tracing::info!(kind = ?fired.payload, "door still open, reminding");
                    let opened_at = data.last_opened_at.unwrap_or_else(time::now);
                    self.arm(&mut data, TimerKind::Reminder, inner.timings.reminder);
                    self.outgoing(&data, EventType::StillOpenReminder, opened_at)
                }
                Some(DoorState::Closed) => {
                    tracing::debug!(kind = ?fired.payload, "door closed, going quiet");
                    None
                }
                None => {
                    tracing::warn!("sensor unreadable when timer fired, checking again later");
                    self.arm(&mut data, TimerKind::Reminder, inner.timings.reminder);
                    None
                }
            }
        };
        self.dispatch(outgoing).await;
    }

    /// Replace the active timer. The previous one, if any, is cancelled first.
    fn arm(&self, data: &mut DoorData, kind: TimerKind, delay: Duration) {
        cancel_timer(data);
        let handle = self.inner.scheduler.schedule(delay, kind);
        tracing::debug!(?kind, delay_secs = delay.as_secs(), "timer armed");
        data.timer = Some(ArmedTimer { handle, kind });
    }

    async fn persist(&self, data: &mut DoorData) {
        match self
            .inner
            .ports
            .repository
            .save(&self.inner.name, &data.record)
            .await
        {
            Ok(()) => {
                if data.durability_degraded {
                    tracing::info!("door record persisted again, durability restored");
                    data.durability_degraded = false;
                }
            }
            Err(err) => {
                tracing::error!(error = ?err, "failed to persist door record, keeping in-memory copy");
                data.durability_degraded = true;
            }
        }
    }

    fn outgoing(&self, data: &DoorData, event: EventType, at: Timestamp) -> Option<Outgoing> {
        let recipients = data.record.subscriptions.recipients(event);
        if recipients.is_empty() {
            tracing::debug!(?event, "no subscribers");
            return None;
        }
        Some(Outgoing {
            event,
            message: event.message(&self.inner.name, &at),
            recipients,
        })
    }

    async fn dispatch(&self, outgoing: impl IntoIterator<Item = Outgoing>) {
        for out in outgoing {
            match self
                .inner
                .ports
                .notifier
                .send(&out.message, &out.recipients)
                .await
            {
                Ok(()) => {
                    tracing::debug!(event = ?out.event, recipients = out.recipients.len(), "notification sent");
                }
                Err(err) => {
                    tracing::warn!(event = ?out.event, error = ?err, "notification delivery failed");
                }
            }
        }
    }
}

fn cancel_timer(data: &mut DoorData) {
    if let Some(timer) = data.timer.take() {
        tracing::debug!(kind = ?timer.kind, "timer cancelled");
        timer.handle.cancel();
    }
}

/// Judge a button press from the positions before and after.
fn toggle_result(begin: DoorState, end: DoorState) -> EventType {
    match (begin, end) {
        (DoorState::Closed, DoorState::Closed) => EventType::ToggleFailedOpen,
        (DoorState::Closed, DoorState::Open) => EventType::ToggleConfirmedOpen,
        (DoorState::Open, DoorState::Open) => EventType::ToggleFailedClosed,
        (DoorState::Open, DoorState::Closed) => EventType::ToggleConfirmedClosed,
    }
}

async fn dispatch_timers<S, A, N, R>(
    inner: Weak<Inner<S, A, N, R>>,
    mut fired_rx: mpsc::UnboundedReceiver<Fired<TimerKind>>,
) where
    S: DoorSensor + 'static,
    A: DoorActuator + 'static,
    N: Notifier + 'static,
    R: DoorRepository + 'static,
{
    while let Some(fired) = fired_rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        DoorController { inner }.on_timer(fired).await;
    }
}

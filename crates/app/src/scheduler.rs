//! Timer scheduler — cancellable, single-fire delayed deliveries.
//!
//! [`TimerScheduler::schedule`] spawns a task that sleeps for the delay and
//! then delivers a [`Fired`] message (the timer id plus a caller-chosen
//! payload) on the scheduler's channel. The owner of the receiving end acts
//! on it; nothing runs inside the timer task itself.
//!
//! Cancellation aborts the sleeping task. A timer that already delivered
//! its message before being cancelled is still observed by the receiver, so
//! receivers compare the [`TimerId`] against the one they expect.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one scheduled timer for the lifetime of its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Message delivered when a timer's delay has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub payload: T,
}

/// Handle to a pending timer.
///
/// Dropping the handle does **not** cancel the timer; call
/// [`cancel`](Self::cancel) explicitly.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    task: JoinHandle<()>,
}

impl TimerHandle {
    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Stop the timer if it has not fired yet. Safe to call after it fired.
    pub fn cancel(self) {
        self.task.abort();
    }
}

/// Issues timers whose firings arrive on a single channel.
pub struct TimerScheduler<T> {
    next_id: AtomicU64,
    fired_tx: mpsc::UnboundedSender<Fired<T>>,
}

impl<T: Send + 'static> TimerScheduler<T> {
    /// Create a scheduler and the receiver its timers deliver to.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired<T>>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: AtomicU64::new(1),
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    /// Deliver `payload` after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, delay: Duration, payload: T) -> TimerHandle {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone only when the owning controller was dropped.
            let _ = tx.send(Fired { id, payload });
        });
        TimerHandle { id, task }
    }
}

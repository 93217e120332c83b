//! Liveness port — periodic "still alive" signal (e.g. a systemd watchdog).

use std::sync::Arc;

/// Receives a beat every time the command loop finishes a bounded wait.
pub trait Liveness: Send + Sync {
    fn beat(&self);
}

/// A [`Liveness`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLiveness;

impl Liveness for NoLiveness {
    fn beat(&self) {}
}

impl<T: Liveness> Liveness for Arc<T> {
    fn beat(&self) {
        (**self).beat();
    }
}

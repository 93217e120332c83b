//! Liveness beats for an external watchdog.

use std::path::PathBuf;

use doorwatch_app::ports::Liveness;
use doorwatch_domain::time;

/// Rewrites a file with the current time on every beat. Without a path,
/// beats are only traced.
#[derive(Debug, Default)]
pub struct Heartbeat {
    path: Option<PathBuf>,
}

impl Heartbeat {
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl Liveness for Heartbeat {
    fn beat(&self) {
        let Some(path) = &self.path else {
            tracing::trace!("liveness beat");
            return;
        };
        if let Err(err) = std::fs::write(path, time::now().to_rfc3339()) {
            tracing::warn!(path = %path.display(), error = %err, "failed to write heartbeat");
        }
    }
}

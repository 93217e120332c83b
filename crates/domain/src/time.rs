//! Time and timestamp helpers.

use chrono::{DateTime, Local, Utc};

/// UTC timestamp used for history entries and message formatting.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp the way it appears in notification text, in the
/// host's local time zone (e.g. `Sat Oct 17 21:04:11 2026`).
#[must_use]
pub fn format_for_message(ts: &Timestamp) -> String {
    ts.with_timezone(&Local)
        .format("%a %b %e %H:%M:%S %Y")
        .to_string()
}

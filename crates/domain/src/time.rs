//! Clock helpers for the publish cadence.
//!
//! The gate runs on wall-clock time rather than a monotonic clock. A step
//! backwards (NTP sync, manual adjustment) has to be observable so the gate
//! can treat it as "interval elapsed" instead of holding every publish until
//! the clock catches up with the last send.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Wall-clock UTC instant.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Time elapsed from `earlier` to `later`.
///
/// `None` when the clock went backwards between the two readings.
#[must_use]
pub fn elapsed(earlier: Timestamp, later: Timestamp) -> Option<Duration> {
    (later - earlier).to_std().ok()
}

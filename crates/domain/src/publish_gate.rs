//! Publish gate — the process-wide publishing cadence.
//!
//! One gate is shared by every device: whichever device's reading arrives
//! first after the interval has elapsed gets to publish, and the wait starts
//! over for all of them.

use std::time::Duration;

use crate::time::{self, Timestamp};

/// Global rate limiter for bus flushes.
#[derive(Debug, Clone)]
pub struct PublishGate {
    interval: Duration,
    last_send: Timestamp,
}

impl PublishGate {
    /// Create a gate whose first window starts at `now`.
    #[must_use]
    pub fn new(interval: Duration, now: Timestamp) -> Self {
        Self {
            interval,
            last_send: now,
        }
    }

    /// Whether a flush at `now` is permitted.
    ///
    /// A clock that moved backwards past the last send counts as elapsed.
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        time::elapsed(self.last_send, now).is_none_or(|elapsed| elapsed >= self.interval)
    }

    /// Claim the gate if it is due, restarting the window at `now`.
    pub fn try_acquire(&mut self, now: Timestamp) -> bool {
        if self.is_due(now) {
            self.last_send = now;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn last_send(&self) -> Timestamp {
        self.last_send
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn should_not_be_due_before_interval() {
        let gate = PublishGate::new(Duration::from_secs(60), at(0));
        assert!(!gate.is_due(at(59)));
    }

    #[test]
    fn should_be_due_at_exact_interval() {
        let gate = PublishGate::new(Duration::from_secs(60), at(0));
        assert!(gate.is_due(at(60)));
    }

    #[test]
    fn should_restart_window_on_acquire() {
        let mut gate = PublishGate::new(Duration::from_secs(60), at(0));
        assert!(gate.try_acquire(at(61)));
        assert_eq!(gate.last_send(), at(61));
        assert!(!gate.try_acquire(at(100)));
        assert!(gate.try_acquire(at(121)));
    }

    #[test]
    fn should_treat_clock_rollback_as_elapsed() {
        let mut gate = PublishGate::new(Duration::from_secs(60), at(0));
        let earlier = at(0) - TimeDelta::seconds(1);
        assert!(gate.try_acquire(earlier));
        assert_eq!(gate.last_send(), earlier);
    }

    #[test]
    fn should_keep_last_send_when_not_due() {
        let mut gate = PublishGate::new(Duration::from_secs(60), at(0));
        assert!(!gate.try_acquire(at(10)));
        assert_eq!(gate.last_send(), at(0));
    }
}

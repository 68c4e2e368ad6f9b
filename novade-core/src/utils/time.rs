//! Timing helpers.
//!
//! Bounded waits (such as waiting for a session to become active) are driven
//! by a [`Deadline`] on the monotonic clock: the caller recomputes the
//! remaining budget on every iteration so the total wait never exceeds the
//! original timeout.

use std::time::{Duration, Instant};

/// Trait to convert something to milliseconds.
pub trait ToMs {
    /// Convert the time to a millisecond representation, saturating at `u64::MAX`.
    fn to_ms(self) -> u64;
}

impl ToMs for Duration {
    fn to_ms(self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }
}

/// A fixed point in monotonic time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self::from_instant(Instant::now(), timeout)
    }

    /// A deadline `timeout` after `start`.
    pub fn from_instant(start: Instant, timeout: Duration) -> Self {
        Self { at: start + timeout }
    }

    /// Time left before the deadline, or `None` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        if now >= self.at {
            None
        } else {
            Some(self.at - now)
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_none()
    }
}

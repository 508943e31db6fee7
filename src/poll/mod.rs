//! Condition polling with a timeout budget.
//!
//! This module is the replacement for "sleep for a while and hope": instead of
//! waiting a fixed duration for some asynchronous side effect, the caller
//! hands over a predicate and a `PollConfig`, and the predicate is checked on a
//! fixed interval until it holds or the budget runs out.
//!
//! The schedule is the same for every variant:
//!
//! 1. The predicate is evaluated immediately on entry.
//! 2. While it returns false and the budget is not spent, the caller is
//!    suspended for `interval` (shortened so the last wait lands on the
//!    deadline) and the predicate is evaluated again.
//! 3. The call ends on the first true evaluation, or with a `TimeoutError`
//!    once an evaluation made at or after the deadline returned false.
//!
//! The async variants live at the top of this module and suspend the calling
//! task with `tokio::time::sleep`. The `blocking` submodule has the same
//! functions for plain threads. Nothing here logs or performs I/O.

pub mod blocking;
mod error;
mod wait;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{AwaitError, TimeoutError};
pub use wait::{await_until, await_until_cancelled, try_await_until};

/// Interval and timeout for one polling call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Time between successive predicate evaluations.
    pub interval: Duration,
    /// Total budget, measured from the moment the call starts.
    pub timeout: Duration,
}

impl PollConfig {
    /// Smallest interval actually slept. Shorter intervals, zero included,
    /// are clamped to this so a false predicate never spins.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The interval after clamping to `MIN_INTERVAL`.
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(Self::MIN_INTERVAL)
    }

    /// How long to sleep before the next check, given the time already spent.
    ///
    /// Returns `None` once the budget is exhausted. The returned wait never
    /// reaches past the deadline.
    pub fn next_wait(&self, elapsed: Duration) -> Option<Duration> {
        let remaining = self.timeout.checked_sub(elapsed)?;
        if remaining.is_zero() {
            return None;
        }
        Some(self.effective_interval().min(remaining))
    }

    pub(crate) fn timed_out(&self, elapsed: Duration, attempts: u32) -> TimeoutError {
        TimeoutError {
            timeout: self.timeout,
            elapsed,
            attempts,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            timeout: Duration::from_millis(5000),
        }
    }
}

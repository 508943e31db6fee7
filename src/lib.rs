//! awaitility - wait for asynchronous side effects by polling, not sleeping.
//!
//! A test that sleeps a fixed time before checking that a server is up is
//! either too slow or flaky. This library provides the alternative: check the
//! condition on a short interval and give up only after a generous timeout.

pub mod app;
pub mod cli;
pub mod config;
pub mod poll;
pub mod probe;
pub mod server;
#[cfg(feature = "test-utils")]
pub mod test_utils;

use std::time::Duration;

pub use poll::{AwaitError, PollConfig, TimeoutError};

/// Blocks the calling thread until `predicate` returns true, checking it every
/// `interval`, or fails once `timeout` has elapsed.
///
/// The first check happens immediately. An `interval` of zero is clamped to
/// [`PollConfig::MIN_INTERVAL`]. For async callers see [`poll::await_until`].
pub fn await_condition<F>(interval: Duration, timeout: Duration, predicate: F) -> Result<(), TimeoutError>
where
    F: FnMut() -> bool,
{
    poll::blocking::await_until(&PollConfig::new(interval, timeout), predicate)
}

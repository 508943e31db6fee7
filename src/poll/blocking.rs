//! Thread-blocking versions of the polling functions.
//!
//! These suspend the calling thread with `std::thread::sleep` and must not be
//! called from inside an async runtime's worker threads.

use std::thread;
use std::time::Instant;

use super::{AwaitError, PollConfig, TimeoutError};

/// Blocks until `predicate` returns true or `config.timeout` elapses.
pub fn await_until<F>(config: &PollConfig, mut predicate: F) -> Result<(), TimeoutError>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let mut attempts = 0;
    loop {
        attempts += 1;
        if predicate() {
            return Ok(());
        }
        let elapsed = start.elapsed();
        match config.next_wait(elapsed) {
            Some(wait) => thread::sleep(wait),
            None => return Err(config.timed_out(elapsed, attempts)),
        }
    }
}

/// Blocking counterpart of [`super::try_await_until`].
pub fn try_await_until<F, E>(config: &PollConfig, mut predicate: F) -> Result<(), AwaitError<E>>
where
    F: FnMut() -> Result<bool, E>,
{
    let start = Instant::now();
    let mut attempts = 0;
    loop {
        attempts += 1;
        match predicate() {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(source) => return Err(AwaitError::Predicate { source, attempts }),
        }
        let elapsed = start.elapsed();
        match config.next_wait(elapsed) {
            Some(wait) => thread::sleep(wait),
            None => return Err(config.timed_out(elapsed, attempts).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn returns_as_soon_as_condition_flips() {
        let mut calls = 0;
        let config = PollConfig::new(Duration::from_millis(5), Duration::from_secs(5));
        let start = Instant::now();
        await_until(&config, || {
            calls += 1;
            calls == 4
        })
        .unwrap();
        assert_eq!(calls, 4);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn zero_timeout_checks_exactly_once() {
        let mut calls = 0;
        let config = PollConfig::new(Duration::from_millis(10), Duration::ZERO);
        let err = await_until(&config, || {
            calls += 1;
            false
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert_eq!(err.attempts, 1);
    }
}

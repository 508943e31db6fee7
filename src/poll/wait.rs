use std::convert::Infallible;
use std::future::Future;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

use super::{AwaitError, PollConfig, TimeoutError};

/// Polls `predicate` until it returns true or `config.timeout` elapses.
///
/// The predicate's future is always driven to completion before the next
/// decision, so a slow check (a network round trip, say) can push the total
/// time past the timeout by at most the cost of that one check.
pub async fn await_until<F, Fut>(config: &PollConfig, mut predicate: F) -> Result<(), TimeoutError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let mut attempts = 0;
    loop {
        attempts += 1;
        if predicate().await {
            return Ok(());
        }
        let elapsed = start.elapsed();
        match config.next_wait(elapsed) {
            Some(wait) => sleep(wait).await,
            None => return Err(config.timed_out(elapsed, attempts)),
        }
    }
}

/// Like [`await_until`], for predicates that can fail.
///
/// `Ok(false)` means "not yet". An `Err` stops polling immediately and is
/// returned as [`AwaitError::Predicate`].
pub async fn try_await_until<F, Fut, E>(config: &PollConfig, mut predicate: F) -> Result<(), AwaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let start = Instant::now();
    let mut attempts = 0;
    loop {
        attempts += 1;
        match predicate().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(source) => return Err(AwaitError::Predicate { source, attempts }),
        }
        let elapsed = start.elapsed();
        match config.next_wait(elapsed) {
            Some(wait) => sleep(wait).await,
            None => return Err(config.timed_out(elapsed, attempts).into()),
        }
    }
}

/// Like [`await_until`], but also gives up when `shutdown_rx` fires.
///
/// Cancellation is observed between checks, never in the middle of one. A
/// closed channel counts as a shutdown. If the shutdown flag is already set on
/// entry the predicate is not evaluated at all.
pub async fn await_until_cancelled<F, Fut>(
    config: &PollConfig,
    mut shutdown_rx: watch::Receiver<bool>,
    mut predicate: F,
) -> Result<(), AwaitError<Infallible>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let mut attempts = 0;
    if *shutdown_rx.borrow_and_update() {
        return Err(AwaitError::Cancelled {
            elapsed: start.elapsed(),
            attempts,
        });
    }
    loop {
        attempts += 1;
        if predicate().await {
            return Ok(());
        }
        let elapsed = start.elapsed();
        let Some(wait) = config.next_wait(elapsed) else {
            return Err(config.timed_out(elapsed, attempts).into());
        };
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                return Err(AwaitError::Cancelled {
                    elapsed: start.elapsed(),
                    attempts,
                });
            }
            _ = sleep(wait) => {}
        }
    }
}

//! Wall-clock behavior of the blocking polling functions.

use awaitility::poll::blocking;
use awaitility::test_utils::FlipAfter;
use awaitility::{await_condition, AwaitError, PollConfig};
use std::io;
use std::time::{Duration, Instant};

mod helpers;
use helpers::ms;

#[test]
fn immediately_true_predicate_returns_without_waiting() {
    let predicate = FlipAfter::new(1);
    let start = Instant::now();

    await_condition(ms(100), ms(5000), || predicate.check()).unwrap();

    assert_eq!(predicate.calls(), 1);
    assert!(start.elapsed() < ms(50), "took {:?}", start.elapsed());
}

#[test]
fn zero_timeout_with_true_predicate_succeeds() {
    await_condition(ms(100), Duration::ZERO, || true).unwrap();
}

#[test]
fn never_true_predicate_fails_within_one_interval_of_the_timeout() {
    let interval = ms(20);
    let timeout = ms(200);
    let start = Instant::now();

    let err = await_condition(interval, timeout, || false).unwrap_err();

    let spent = start.elapsed();
    assert!(spent >= timeout, "returned early after {:?}", spent);
    assert!(spent < timeout + interval + ms(100), "overshot: {:?}", spent);
    assert_eq!(err.timeout, timeout);
    assert!(err.elapsed >= timeout);
    assert!(err.attempts >= 2);
}

#[test]
fn returns_once_the_condition_flips_without_using_the_full_budget() {
    let predicate = FlipAfter::new(5);
    let start = Instant::now();

    await_condition(ms(10), ms(5000), || predicate.check()).unwrap();

    assert_eq!(predicate.calls(), 5);
    assert!(start.elapsed() < ms(1000), "took {:?}", start.elapsed());
}

#[test]
fn repeated_calls_share_no_state() {
    for _ in 0..2 {
        let predicate = FlipAfter::new(1);
        await_condition(ms(10), ms(100), || predicate.check()).unwrap();
        assert_eq!(predicate.calls(), 1);
    }
}

#[test]
fn zero_interval_still_respects_the_timeout() {
    let predicate = FlipAfter::never();
    let start = Instant::now();

    let err = await_condition(Duration::ZERO, ms(50), || predicate.check()).unwrap_err();

    assert!(start.elapsed() >= ms(50));
    assert!(start.elapsed() < ms(500));
    // Clamped to a 1ms tick: bounded by the budget, not a spin.
    assert!(predicate.calls() <= 52, "{} calls", predicate.calls());
    assert_eq!(err.attempts, predicate.calls());
}

#[test]
fn interval_longer_than_timeout_checks_at_start_and_deadline() {
    let predicate = FlipAfter::never();
    let start = Instant::now();

    await_condition(ms(1000), ms(100), || predicate.check()).unwrap_err();

    assert_eq!(predicate.calls(), 2);
    assert!(start.elapsed() < ms(500));
}

#[test]
fn predicate_is_not_called_after_success() {
    let predicate = FlipAfter::new(3);
    await_condition(ms(5), ms(1000), || predicate.check()).unwrap();
    std::thread::sleep(ms(30));
    assert_eq!(predicate.calls(), 3);
}

#[test]
fn predicate_error_is_reported_separately_from_timeout() {
    let mut calls = 0;
    let config = PollConfig::new(ms(5), ms(1000));

    let err = blocking::try_await_until(&config, || {
        calls += 1;
        if calls < 2 {
            Ok(false)
        } else {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        }
    })
    .unwrap_err();

    assert!(!err.is_timeout());
    match err {
        AwaitError::Predicate { source, attempts } => {
            assert_eq!(source.kind(), io::ErrorKind::ConnectionRefused);
            assert_eq!(attempts, 2);
        }
        other => panic!("expected a predicate error, got {:?}", other),
    }
    assert_eq!(calls, 2);
}

#[test]
fn fallible_predicate_that_stays_false_times_out() {
    let config = PollConfig::new(ms(10), ms(50));
    let err = blocking::try_await_until(&config, || Ok::<_, io::Error>(false)).unwrap_err();
    assert!(err.is_timeout());
}

use std::time::Duration;
use thiserror::Error;

/// The awaited condition did not become true within the timeout budget.
///
/// Carries the configured budget, the time actually spent, and how many times
/// the predicate was evaluated, so a caller can log a useful diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {elapsed:?} waiting for condition (timeout {timeout:?}, {attempts} checks)")]
pub struct TimeoutError {
    /// The configured timeout budget.
    pub timeout: Duration,
    /// Wall-clock time spent polling before giving up.
    pub elapsed: Duration,
    /// Number of predicate evaluations performed.
    pub attempts: u32,
}

/// Outcome of the extended polling variants.
///
/// `E` is the error type a fallible predicate can report. It is kept apart
/// from `Timeout` so "the check itself broke" is never mistaken for "the
/// condition is still false".
#[derive(Debug, Error)]
pub enum AwaitError<E> {
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("condition check failed after {attempts} checks")]
    Predicate {
        #[source]
        source: E,
        attempts: u32,
    },

    #[error("wait cancelled after {elapsed:?} ({attempts} checks)")]
    Cancelled { elapsed: Duration, attempts: u32 },
}

impl<E> AwaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AwaitError::Timeout(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AwaitError::Cancelled { .. })
    }

    /// Number of predicate evaluations performed before the call ended.
    pub fn attempts(&self) -> u32 {
        match self {
            AwaitError::Timeout(e) => e.attempts,
            AwaitError::Predicate { attempts, .. } => *attempts,
            AwaitError::Cancelled { attempts, .. } => *attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn timeout_message_names_budget_and_attempts() {
        let err = TimeoutError {
            timeout: Duration::from_secs(5),
            elapsed: Duration::from_millis(5002),
            attempts: 51,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("timed out after 5.002s"));
        assert!(msg.contains("timeout 5s"));
        assert!(msg.contains("51 checks"));
    }

    #[test]
    fn predicate_error_keeps_its_source() {
        let err: AwaitError<io::Error> = AwaitError::Predicate {
            source: io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"),
            attempts: 3,
        };
        assert!(!err.is_timeout());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.source().map(|s| s.to_string()), Some("reset by peer".to_string()));
    }

    #[test]
    fn timeout_converts_into_await_error() {
        let timeout = TimeoutError {
            timeout: Duration::from_millis(10),
            elapsed: Duration::from_millis(10),
            attempts: 2,
        };
        let err: AwaitError<io::Error> = timeout.into();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), timeout.to_string());
    }
}

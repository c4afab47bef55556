//! Bounded retry for directory mutations.

use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

const MAX_DELAY: Duration = Duration::from_secs(30);

/// Delays between attempts: `base`, `2*base`, `4*base`, ... with jitter,
/// capped at 30 seconds. Yields `max_attempts - 1` delays.
fn backoff(max_attempts: u32, base_delay_ms: u64) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(base_delay_ms)
        .map(|d| (d / 2).min(MAX_DELAY))
        .map(jitter)
        .take(max_attempts.saturating_sub(1) as usize)
}

/// Runs `operation` up to `max_attempts` times.
///
/// Every error is retried. Before each retry `observer` receives the error and
/// the 1-based number of the attempt that failed. When the budget is spent the
/// last error is returned as is and the observer is not called for it, so an
/// operation that always fails runs `max_attempts` times and is observed
/// `max_attempts - 1` times. A budget of zero behaves like one.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn retry_with_observer<T, E, F, Fut, O>(
    max_attempts: u32,
    base_delay_ms: u64,
    mut observer: O,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    O: FnMut(&E, u32),
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;

    RetryIf::spawn(
        backoff(max_attempts, base_delay_ms),
        operation,
        move |error: &E| {
            attempt += 1;
            if attempt < max_attempts {
                observer(error, attempt);
                true
            } else {
                false
            }
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    struct Fault(u32);

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        let calls = AtomicU32::new(0);
        let mut observed = Vec::new();

        let result = retry_with_observer(
            5,
            0,
            |e: &Fault, attempt| observed.push((e.0, attempt)),
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 5 { Err(Fault(n)) } else { Ok(n) }
            },
        )
        .await;

        assert_eq!(result, Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(observed, vec![(1, 1), (2, 2), (3, 3), (4, 4)]);
    }

    #[tokio::test]
    async fn test_always_failing_returns_last_error() {
        let calls = AtomicU32::new(0);
        let mut observed = 0;

        let result: Result<(), Fault> = retry_with_observer(
            5,
            0,
            |_, _| observed += 1,
            || async { Err(Fault(calls.fetch_add(1, Ordering::SeqCst) + 1)) },
        )
        .await;

        assert_eq!(result, Err(Fault(5)));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(observed, 4);
    }

    #[tokio::test]
    async fn test_first_success_is_not_observed() {
        let mut observed = 0;
        let result: Result<&str, Fault> =
            retry_with_observer(3, 0, |_, _| observed += 1, || async { Ok("done") }).await;

        assert_eq!(result, Ok("done"));
        assert_eq!(observed, 0);
    }

    #[tokio::test]
    async fn test_zero_budget_runs_once() {
        let calls = AtomicU32::new(0);
        let mut observed = 0;

        let result: Result<(), Fault> = retry_with_observer(
            0,
            0,
            |_, _| observed += 1,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Fault(0))
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(observed, 0);
    }

    #[test]
    fn test_backoff_is_bounded() {
        let delays: Vec<_> = backoff(5, 100).collect();
        assert_eq!(delays.len(), 4);
        assert!(delays.iter().all(|d| *d <= MAX_DELAY));
        assert!(delays[0] <= Duration::from_millis(100));

        assert_eq!(backoff(1, 100).count(), 0);
        assert!(backoff(40, 100).all(|d| d <= MAX_DELAY));
    }
}

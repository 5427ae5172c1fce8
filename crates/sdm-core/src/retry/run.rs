//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

/// Result of a retried operation plus the number of attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, FetchError>,
    pub attempts: u32,
}

/// Runs `f` until it succeeds or the retry policy says to stop, sleeping the
/// policy's initial delay first and its retry delay after each failure.
/// `f` receives the 1-based attempt number.
pub async fn run_with_retry<F, Fut, T>(policy: &RetryPolicy, mut f: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    if !policy.initial_delay.is_zero() {
        tokio::time::sleep(policy.initial_delay).await;
    }
    let mut attempt = 1u32;
    loop {
        match f(attempt).await {
            Ok(v) => {
                return RetryOutcome {
                    result: Ok(v),
                    attempts: attempt,
                }
            }
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return RetryOutcome {
                            result: Err(e),
                            attempts: attempt,
                        }
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!(attempt, ?kind, "attempt failed: {}; retrying in {:?}", e, d);
                        tokio::time::sleep(d).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}

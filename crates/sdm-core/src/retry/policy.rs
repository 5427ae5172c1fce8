use std::time::Duration;

/// High-level classification of a fetch failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Media not prepared yet (error document, 403/404 from the CDN).
    NotReady,
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// Retryable server error (5xx).
    Http5xx(u16),
    /// Local disk failure; another attempt would hit the same wall.
    Storage,
    /// Anything else.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Fixed-delay retry policy for renditions that need server-side preparation.
///
/// The first attempt is preceded by `initial_delay`; every later attempt by
/// `retry_delay`. Nothing is slept after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Head start before the first attempt.
    pub initial_delay: Duration,
    /// Pause between failed attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_secs(6),
            retry_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt with no delays.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
        }
    }

    /// Decide what follows a failed attempt.
    ///
    /// `attempt` is 1-based (1 = first attempt).
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        match kind {
            ErrorKind::Storage => RetryDecision::NoRetry,
            ErrorKind::NotReady
            | ErrorKind::Timeout
            | ErrorKind::Throttled
            | ErrorKind::Connection
            | ErrorKind::Http5xx(_)
            | ErrorKind::Other => RetryDecision::RetryAfter(self.retry_delay),
        }
    }
}

//! Retry policy for media that needs server-side preparation.
//!
//! This module encapsulates failure classification (not-ready error
//! documents, throttling, connection failures, disk errors) and the
//! fixed-delay retry loop so that the media strategies share one policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryOutcome};

//! Fetch error type for retry classification.

use std::fmt;

/// Error returned by one fetch-validate-save attempt.
/// Kept separate from `anyhow` so the retry loop can classify it.
#[derive(Debug)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// A small 2xx body that is an error document, not media
    /// (the CDN answers not-ready or denied media this way).
    ErrorPayload { bytes: usize },
    /// Saving the artifact failed (disk full, permission denied). Not retried.
    Storage(std::io::Error),
    /// The blocking worker running the transfer went away.
    Worker(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::ErrorPayload { bytes } => {
                write!(f, "server returned an error document ({} bytes) instead of media", bytes)
            }
            FetchError::Storage(e) => write!(f, "storage: {}", e),
            FetchError::Worker(msg) => write!(f, "transfer worker: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            FetchError::Storage(e) => Some(e),
            FetchError::Http(_) | FetchError::ErrorPayload { .. } | FetchError::Worker(_) => None,
        }
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Curl(e)
    }
}

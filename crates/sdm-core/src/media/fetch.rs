//! The fetch, validate, save primitive shared by every format.
//!
//! The CDN answers not-ready or access-denied media with small XML error
//! documents and a success status, so a 2xx alone does not mean media.

use std::path::PathBuf;

use super::transport::{HttpResponse, HttpTransport};
use crate::retry::FetchError;
use crate::storage::ArtifactSink;

/// Bodies below this size are inspected for error markers.
pub const SMALL_BODY_LIMIT: usize = 1000;

/// Substrings that identify an error document.
pub const ERROR_MARKERS: [&str; 3] = ["<?xml", "<Error>", "AccessDenied"];

/// Whether `body` reads as a structured error payload rather than media.
pub fn looks_like_error_payload(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body);
    ERROR_MARKERS.iter().any(|m| text.contains(m))
}

/// Checks that a response carries media: 2xx status, non-empty body, and
/// (for small bodies) no error markers.
pub fn validate(resp: &HttpResponse) -> Result<(), FetchError> {
    if !resp.is_success() {
        return Err(FetchError::Http(resp.status));
    }
    let bytes = resp.body.len();
    if bytes == 0 || (bytes < SMALL_BODY_LIMIT && looks_like_error_payload(&resp.body)) {
        return Err(FetchError::ErrorPayload { bytes });
    }
    Ok(())
}

/// Fetches `url`, validates the body and persists it under `filename`.
pub async fn fetch_validate_save<T, S>(
    transport: &T,
    sink: &S,
    url: &str,
    filename: &str,
) -> Result<PathBuf, FetchError>
where
    T: HttpTransport,
    S: ArtifactSink,
{
    let resp = transport.get(url).await?;
    validate(&resp)?;
    sink.save(filename, resp.body)
        .await
        .map_err(FetchError::Storage)
}

//! Classify HTTP status, curl errors and validation failures into retry kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
///
/// The CDN answers 403/404 for renditions that are not prepared yet.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        403 | 404 => ErrorKind::NotReady,
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::ErrorPayload { .. } => ErrorKind::NotReady,
        FetchError::Storage(_) => ErrorKind::Storage,
        FetchError::Worker(_) => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn http_5xx_retryable() {
        assert!(matches!(classify_http_status(500), ErrorKind::Http5xx(500)));
        assert!(matches!(classify_http_status(502), ErrorKind::Http5xx(502)));
    }

    #[test]
    fn cdn_not_ready_statuses() {
        assert_eq!(classify_http_status(403), ErrorKind::NotReady);
        assert_eq!(classify_http_status(404), ErrorKind::NotReady);
        assert_eq!(classify_http_status(400), ErrorKind::Other);
    }

    #[test]
    fn validation_and_storage_failures() {
        assert_eq!(
            classify(&FetchError::ErrorPayload { bytes: 240 }),
            ErrorKind::NotReady
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "ro");
        assert_eq!(classify(&FetchError::Storage(io)), ErrorKind::Storage);
    }
}

use std::time::Duration;

/// Failure of a single bridge call. Never retried by the bridge itself.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("bridge request '{action}' timed out after {after:?}")]
    Timeout { action: String, after: Duration },

    #[error("bridge transport closed")]
    Disconnected,

    #[error("malformed bridge reply to '{action}': {source}")]
    Malformed {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode bridge request: {0}")]
    Encode(#[from] serde_json::Error),
}

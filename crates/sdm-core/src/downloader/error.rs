use thiserror::Error;

/// Reasons a run does not start. Per-item failures are never errors here;
/// they are recorded on the job and reported as progress events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DownloadError {
    #[error("a download run is already in progress")]
    AlreadyRunning,
    #[error("media agent did not become ready after {attempts} polls")]
    BridgeNotReady { attempts: u32 },
}

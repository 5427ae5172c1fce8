use serde::{Deserialize, Serialize};

use crate::catalog::{Format, Item};

/// Where a run is in its per-item state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Complete,
    Error,
    Stopped,
    Finished,
}

/// One progress event; emitted after every state change of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// 1-based index of the item the event is about (0 before any item).
    pub current: usize,
    pub total: usize,
    pub song_name: String,
    /// Human-readable step description.
    pub step: String,
    pub status: ProgressStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// One item's download, created when the item is dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadJob {
    pub item: Item,
    pub format: Format,
    pub state: JobState,
    pub attempts: u32,
    pub last_error: Option<String>,
    /// Name the artifact was saved under, on success.
    pub filename: Option<String>,
}

impl DownloadJob {
    pub fn new(item: Item, format: Format) -> Self {
        Self {
            item,
            format,
            state: JobState::Pending,
            attempts: 0,
            last_error: None,
            filename: None,
        }
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Whether the run ended on a stop request.
    pub stopped: bool,
    pub jobs: Vec<DownloadJob>,
}

//! Sequential download orchestration.
//!
//! One run at a time: items are dispatched to the media agent over the
//! [`Bridge`] in input order, one in flight, with a fixed pause between
//! them. Every state change is reported as a [`ProgressEvent`]; an item's
//! failure ends that item only.
//!
//! ```text
//!   begin (claims the run slot, no await before it)
//!     └── readiness handshake ── not ready → error event, BridgeNotReady
//!   for each item
//!     ├── stop requested? → stopped event, leave loop
//!     ├── downloading event
//!     ├── bridge call (downloadMP3 | downloadWAV)
//!     ├── complete | error event
//!     └── inter-item delay (not after the last item or a stop request)
//!   finished event; the guard releases the slot
//! ```

mod error;
mod types;

pub use error::DownloadError;
pub use types::{DownloadJob, JobState, ProgressEvent, ProgressStatus, RunSummary};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::{Bridge, DownloadReply, DownloadRequest};
use crate::catalog::{Format, Item};
use crate::config::SdmConfig;
use crate::control::{ActiveRun, RunControl};

/// Knobs of a run (`[download]` in config.toml, plus the `[wav]` attempt ceiling).
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub inter_item_delay: Duration,
    pub ready_poll_attempts: u32,
    pub ready_poll_interval: Duration,
    pub wav_max_attempts: u32,
}

impl RunSettings {
    pub fn from_config(cfg: &SdmConfig) -> Self {
        Self {
            inter_item_delay: Duration::from_millis(cfg.download.inter_item_delay_ms),
            ready_poll_attempts: cfg.download.ready_poll_attempts,
            ready_poll_interval: Duration::from_millis(cfg.download.ready_poll_interval_ms),
            wav_max_attempts: cfg.wav.policy().max_attempts,
        }
    }

    /// Most attempts a job in `format` can have made.
    pub fn attempt_ceiling(&self, format: Format) -> u32 {
        match format {
            Format::Mp3 => 1,
            Format::Wav => self.wav_max_attempts,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&SdmConfig::default())
    }
}

/// Progress sink for one run. A dropped receiver is not an error.
struct Reporter {
    tx: UnboundedSender<ProgressEvent>,
    total: usize,
}

impl Reporter {
    fn emit(&self, current: usize, song_name: &str, step: String, status: ProgressStatus) {
        debug!(current, total = self.total, ?status, %step, "progress");
        let _ = self.tx.send(ProgressEvent {
            current,
            total: self.total,
            song_name: song_name.to_string(),
            step,
            status,
        });
    }
}

#[derive(Clone)]
pub struct Downloader {
    bridge: Bridge,
    control: Arc<RunControl>,
    settings: RunSettings,
}

impl Downloader {
    pub fn new(bridge: Bridge, settings: RunSettings) -> Self {
        Self {
            bridge,
            control: Arc::new(RunControl::new()),
            settings,
        }
    }

    pub fn control(&self) -> Arc<RunControl> {
        Arc::clone(&self.control)
    }

    pub fn is_active(&self) -> bool {
        self.control.is_active()
    }

    /// Requests the active run to stop before its next item. The current
    /// item, retries included, is allowed to finish.
    pub fn stop(&self) {
        info!("stop requested");
        self.control.request_stop();
    }

    /// Claims the run slot without suspending.
    pub fn begin(&self) -> Result<ActiveRun, DownloadError> {
        self.control.try_begin().ok_or_else(|| {
            warn!("download already in progress; rejecting new run");
            DownloadError::AlreadyRunning
        })
    }

    /// Runs to completion or stop on the current task.
    pub async fn run(
        &self,
        items: Vec<Item>,
        format: Format,
        events: UnboundedSender<ProgressEvent>,
    ) -> Result<RunSummary, DownloadError> {
        let run = self.begin()?;
        self.run_claimed(run, items, format, events).await
    }

    /// Fire-and-forget start. Rejection is reported synchronously; the run
    /// itself continues on a spawned task.
    pub fn start(
        &self,
        items: Vec<Item>,
        format: Format,
        events: UnboundedSender<ProgressEvent>,
    ) -> Result<JoinHandle<Result<RunSummary, DownloadError>>, DownloadError> {
        let run = self.begin()?;
        let this = self.clone();
        Ok(tokio::spawn(async move {
            this.run_claimed(run, items, format, events).await
        }))
    }

    async fn run_claimed(
        &self,
        run: ActiveRun,
        items: Vec<Item>,
        format: Format,
        events: UnboundedSender<ProgressEvent>,
    ) -> Result<RunSummary, DownloadError> {
        let report = Reporter {
            tx: events,
            total: items.len(),
        };
        let settings = self.settings;

        if !self
            .bridge
            .wait_ready(settings.ready_poll_attempts, settings.ready_poll_interval)
            .await
        {
            warn!("media agent never became ready; aborting run");
            report.emit(
                0,
                "",
                "Initialization failed: media agent not ready".to_string(),
                ProgressStatus::Error,
            );
            return Err(DownloadError::BridgeNotReady {
                attempts: settings.ready_poll_attempts,
            });
        }

        info!(items = items.len(), %format, "download run started");
        let mut summary = RunSummary::default();
        let count = items.len();

        for (idx, item) in items.into_iter().enumerate() {
            let current = idx + 1;
            if run.stop_requested() {
                info!(current, "run stopped before item");
                report.emit(idx, "", "Stopped by user".to_string(), ProgressStatus::Stopped);
                summary.stopped = true;
                break;
            }

            report.emit(
                current,
                &item.title,
                format!("Downloading {}...", format),
                ProgressStatus::Downloading,
            );
            let job = self.dispatch(DownloadJob::new(item, format)).await;

            match job.state {
                JobState::Succeeded => {
                    summary.succeeded += 1;
                    let filename = job.filename.clone().unwrap_or_default();
                    report.emit(
                        current,
                        &job.item.title,
                        format!("Saved {}", filename),
                        ProgressStatus::Complete,
                    );
                }
                _ => {
                    summary.failed += 1;
                    let reason = job.last_error.clone().unwrap_or_default();
                    report.emit(current, &job.item.title, reason, ProgressStatus::Error);
                }
            }
            summary.jobs.push(job);

            if current < count && !run.stop_requested() {
                tokio::time::sleep(settings.inter_item_delay).await;
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            stopped = summary.stopped,
            "download run finished"
        );
        report.emit(
            summary.jobs.len(),
            "",
            format!(
                "Done: {} succeeded, {} failed",
                summary.succeeded, summary.failed
            ),
            ProgressStatus::Finished,
        );
        drop(run);
        Ok(summary)
    }

    /// Sends one job to the agent and records the outcome on it.
    async fn dispatch(&self, mut job: DownloadJob) -> DownloadJob {
        job.state = JobState::InFlight;
        let request = DownloadRequest {
            clip_id: job.item.id.clone(),
            title: job.item.title.clone(),
        };

        match self
            .bridge
            .call::<_, DownloadReply>(job.format.bridge_action(), &request)
            .await
        {
            Ok(reply) => {
                let ceiling = self.settings.attempt_ceiling(job.format);
                if reply.attempts > ceiling {
                    warn!(id = %job.item.id, reported = reply.attempts, ceiling, "agent over-reported attempts");
                }
                job.attempts = reply.attempts.clamp(1, ceiling);
                if reply.success {
                    job.state = JobState::Succeeded;
                    job.filename = Some(reply.filename);
                } else {
                    job.state = JobState::Failed;
                    job.last_error =
                        Some(reply.error.unwrap_or_else(|| "download failed".to_string()));
                }
            }
            Err(e) => {
                job.attempts = 1;
                job.state = JobState::Failed;
                job.last_error = Some(e.to_string());
            }
        }

        match job.state {
            JobState::Succeeded => {
                info!(id = %job.item.id, attempts = job.attempts, "item downloaded")
            }
            _ => warn!(
                id = %job.item.id,
                attempts = job.attempts,
                error = ?job.last_error,
                "item failed"
            ),
        }
        job
    }
}

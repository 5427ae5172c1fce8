//! Session facade: the calls a front end makes, over one collector and one
//! downloader.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::info;

use crate::bridge::{duplex, Bridge};
use crate::catalog::{Format, Item};
use crate::collector::{Collector, PageSurface, ScanReport};
use crate::config::SdmConfig;
use crate::downloader::{DownloadError, Downloader, ProgressEvent, RunSettings, RunSummary};
use crate::media::{CurlOptions, CurlTransport, HttpTransport, MediaAgent, AGENT_VERSION};
use crate::protocol::{ControlReply, ControlRequest};
use crate::storage::{ArtifactSink, DirectorySink};

/// Runs `agent` on its own task and returns a bridge to it.
pub fn connect_agent<T, S>(agent: MediaAgent<T, S>, timeout: Duration) -> Bridge
where
    T: HttpTransport,
    S: ArtifactSink,
{
    let (ours, theirs) = duplex();
    tokio::spawn(agent.with_call_deadline(timeout).serve(theirs));
    Bridge::connect(ours, timeout)
}

pub struct Session {
    collector: Collector,
    downloader: Downloader,
}

impl Session {
    pub fn new(cfg: &SdmConfig, bridge: Bridge) -> Self {
        Self {
            collector: Collector::new(cfg.scan.clone()),
            downloader: Downloader::new(bridge, RunSettings::from_config(cfg)),
        }
    }

    /// Session backed by libcurl, saving into `out_dir` (falls back to
    /// `[download].output_dir`, then the current directory).
    pub fn with_curl(cfg: &SdmConfig, out_dir: Option<PathBuf>) -> Self {
        let dir = out_dir
            .or_else(|| cfg.download.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        info!(dir = %dir.display(), "artifacts will be saved here");
        let agent = MediaAgent::from_config(
            CurlTransport::new(CurlOptions::from_config(&cfg.media)),
            DirectorySink::new(dir),
            cfg,
        );
        let timeout = Duration::from_secs(cfg.download.request_timeout_secs);
        Self::new(cfg, connect_agent(agent, timeout))
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    pub async fn scan<P: PageSurface>(&self, page: &mut P) -> ScanReport {
        self.collector.collect(page).await
    }

    pub fn quick_scan<P: PageSurface>(&self, page: &P) -> ScanReport {
        self.collector.quick_collect(page)
    }

    pub fn start_download(
        &self,
        items: Vec<Item>,
        format: Format,
        events: UnboundedSender<ProgressEvent>,
    ) -> Result<JoinHandle<Result<RunSummary, DownloadError>>, DownloadError> {
        self.downloader.start(items, format, events)
    }

    pub fn stop_download(&self) -> ControlReply {
        self.downloader.stop();
        ControlReply::stopped()
    }

    pub fn ping(&self) -> ControlReply {
        ControlReply::ok(AGENT_VERSION, self.downloader.is_active())
    }

    pub fn handle_control(&self, request: ControlRequest) -> ControlReply {
        match request {
            ControlRequest::Ping => self.ping(),
            ControlRequest::StopDownload => self.stop_download(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SnapshotReel;
    use crate::protocol::STATUS_OK;

    fn page() -> SnapshotReel {
        let links: String = (0..3)
            .map(|i| format!(r#"<a href="/song/{i:08x}-93b4-4d6e-8a1f-2b3c4d5e6f70">Song {i}</a>"#))
            .collect();
        SnapshotReel::from_frames(vec![format!("<p>3 songs</p>{links}")]).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn scan_and_control_calls() {
        let (ours, _theirs) = duplex();
        let session = Session::new(&SdmConfig::default(), Bridge::connect(ours, Duration::from_secs(1)));

        let mut reel = page();
        let full = session.scan(&mut reel).await;
        let quick = session.quick_scan(&reel);
        assert_eq!(full.catalog.len(), 3);
        assert_eq!(quick.catalog.len(), 3);
        assert_eq!(quick.expected_count, Some(3));

        let pong = session.handle_control(ControlRequest::Ping);
        assert_eq!(pong.status, STATUS_OK);
        assert_eq!(pong.active, Some(false));
        assert_eq!(session.handle_control(ControlRequest::StopDownload), ControlReply::stopped());
    }
}

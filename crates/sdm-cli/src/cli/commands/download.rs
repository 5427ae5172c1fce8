//! `sdm download <CATALOG>` – download catalog items one at a time.

use anyhow::{bail, Context, Result};
use sdm_core::catalog::{CatalogListing, Format};
use sdm_core::config::SdmConfig;
use sdm_core::downloader::{ProgressEvent, ProgressStatus};
use sdm_core::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::control_socket;

fn read_listing(path: &Path) -> Result<CatalogListing> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("read catalog: {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parse catalog: {}", path.display()))
}

pub(crate) fn format_event(ev: &ProgressEvent) -> String {
    let tag = match ev.status {
        ProgressStatus::Downloading => "..",
        ProgressStatus::Complete => "ok",
        ProgressStatus::Error => "!!",
        ProgressStatus::Stopped => "--",
        ProgressStatus::Finished => "==",
    };
    if ev.song_name.is_empty() {
        format!("[{}/{}] {} {}", ev.current, ev.total, tag, ev.step)
    } else {
        format!("[{}/{}] {} {}: {}", ev.current, ev.total, tag, ev.song_name, ev.step)
    }
}

pub async fn run_download(
    cfg: &SdmConfig,
    catalog: &Path,
    format: Format,
    only: &[String],
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let items = read_listing(catalog)?.select(only);
    if items.is_empty() {
        bail!("no items to download in {}", catalog.display());
    }

    let session = Arc::new(Session::with_curl(cfg, out_dir));

    let socket_path = sdm_core::control::default_control_socket_path().ok();
    if let Some(path) = &socket_path {
        match control_socket::spawn_control_listener(Arc::clone(&session), path) {
            Ok(_) => tracing::debug!(path = %path.display(), "control socket listening"),
            Err(e) => tracing::warn!(path = %path.display(), "control socket unavailable: {:#}", e),
        }
    }

    let downloader = session.downloader().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Stopping after the current item...");
            downloader.stop();
        }
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = session.start_download(items, format, tx)?;
    while let Some(ev) = rx.recv().await {
        println!("{}", format_event(&ev));
    }
    let outcome = handle.await.context("download task panicked")?;

    if let Some(path) = &socket_path {
        let _ = std::fs::remove_file(path);
    }

    let summary = outcome?;
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        stopped = summary.stopped,
        "download command finished"
    );
    Ok(())
}

//! End-to-end: downloader → bridge → media agent → libcurl → local server.

mod common;

use common::media_server::{ok, xml_error, MediaServer};
use sdm_core::catalog::{Format, Item};
use sdm_core::config::SdmConfig;
use sdm_core::downloader::{JobState, ProgressStatus};
use sdm_core::media::{CurlOptions, CurlTransport, MediaAgent};
use sdm_core::session::{connect_agent, Session};
use sdm_core::storage::DirectorySink;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

fn item(n: u8) -> Item {
    let id = format!("{n:08x}-93b4-4d6e-8a1f-2b3c4d5e6f70");
    Item {
        title: format!("Track {n}"),
        source_ref: format!("/song/{id}"),
        id,
    }
}

fn fast_config(server: &MediaServer, token: Option<&str>) -> SdmConfig {
    let mut cfg = SdmConfig::default();
    cfg.media.cdn_base = server.base.clone();
    cfg.media.api_base = format!("{}/api", server.base);
    cfg.media.connect_timeout_secs = 5;
    cfg.media.transfer_timeout_secs = 10;
    cfg.download.inter_item_delay_ms = 10;
    cfg.download.ready_poll_interval_ms = 10;
    cfg.download.request_timeout_secs = 30;
    cfg.wav.first_delay_ms = 10;
    cfg.wav.retry_delay_ms = 10;
    cfg.auth.session_token = token.map(str::to_string);
    cfg
}

fn session(cfg: &SdmConfig, dir: &Path) -> Session {
    let agent = MediaAgent::from_config(
        CurlTransport::new(CurlOptions::from_config(&cfg.media)),
        DirectorySink::new(dir),
        cfg,
    );
    let bridge = connect_agent(agent, Duration::from_secs(cfg.download.request_timeout_secs));
    Session::new(cfg, bridge)
}

#[tokio::test]
async fn mp3_run_saves_good_items_and_rejects_error_documents() {
    let server = MediaServer::start();
    let (a, b) = (item(1), item(2));
    server.script(&format!("/{}.mp3", a.id), vec![ok(vec![7u8; 64 * 1024])]);
    server.script(&format!("/{}.mp3", b.id), vec![xml_error()]);

    let dir = tempfile::tempdir().unwrap();
    let cfg = fast_config(&server, None);
    let session = session(&cfg, dir.path());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let summary = session
        .start_download(vec![a, b], Format::Mp3, tx)
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    let saved = std::fs::read(dir.path().join("Track 1.mp3")).unwrap();
    assert_eq!(saved.len(), 64 * 1024);
    assert!(!dir.path().join("Track 2.mp3").exists());
    assert!(!dir.path().join("Track 1.mp3.part").exists());

    let mut statuses = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        statuses.push(ev.status);
    }
    assert_eq!(statuses.last(), Some(&ProgressStatus::Finished));
}

#[tokio::test]
async fn wav_run_requests_conversion_then_polls_until_ready() {
    let server = MediaServer::start();
    let it = item(3);
    let wav_path = format!("/{}.wav", it.id);
    let convert_path = format!("/api/gen/{}/convert_wav/", it.id);
    server.script(&wav_path, vec![xml_error(), xml_error(), ok(vec![1u8; 10_000])]);
    server.script(&convert_path, vec![ok(Vec::new())]);

    let dir = tempfile::tempdir().unwrap();
    let cfg = fast_config(&server, Some("secret-token"));
    let session = session(&cfg, dir.path());
    let (tx, _rx) = mpsc::unbounded_channel();

    let summary = session
        .start_download(vec![it], Format::Wav, tx)
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    let job = &summary.jobs[0];
    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.attempts, 3);
    assert_eq!(server.hits(&wav_path).len(), 3);

    let convert = server.hits(&convert_path);
    assert_eq!(convert.len(), 1);
    assert_eq!(convert[0].method, "POST");
    assert_eq!(convert[0].authorization.as_deref(), Some("Bearer secret-token"));
    assert!(dir.path().join("Track 3.wav").exists());
}

#[tokio::test]
async fn duplicate_titles_get_numbered_names() {
    let server = MediaServer::start();
    let (mut a, mut b) = (item(4), item(5));
    a.title = "Same".to_string();
    b.title = "Same".to_string();
    server.script(&format!("/{}.mp3", a.id), vec![ok(vec![1u8; 4096])]);
    server.script(&format!("/{}.mp3", b.id), vec![ok(vec![2u8; 4096])]);

    let dir = tempfile::tempdir().unwrap();
    let cfg = fast_config(&server, None);
    let session = session(&cfg, dir.path());
    let (tx, _rx) = mpsc::unbounded_channel();

    let summary = session
        .start_download(vec![a, b], Format::Mp3, tx)
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.jobs[1].filename.as_deref(), Some("Same (1).mp3"));
    assert_eq!(std::fs::read(dir.path().join("Same.mp3")).unwrap()[0], 1);
    assert_eq!(std::fs::read(dir.path().join("Same (1).mp3")).unwrap()[0], 2);
}

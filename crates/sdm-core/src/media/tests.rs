//! Tests for the media agent: strategies, validation and the serve loop.

use serde_json::{json, Value};
use std::time::Duration;

use super::testing::{audio, not_ready, PostOutcome, ScriptedTransport};
use super::*;
use crate::bridge::{duplex, Bridge};
use crate::storage::DirectorySink;

const CDN: &str = "https://cdn.test";
const API: &str = "https://api.test/api";
const ID: &str = "0f2a6c1e-93b4-4d6e-8a1f-2b3c4d5e6f70";

fn agent(
    transport: ScriptedTransport,
    dir: &std::path::Path,
    token: Option<&str>,
) -> MediaAgent<ScriptedTransport, DirectorySink> {
    MediaAgent::new(
        transport,
        DirectorySink::new(dir),
        MediaEndpoints {
            api_base: API.to_string(),
            cdn_base: CDN.to_string(),
        },
        SessionCredentials::new(token.map(str::to_string), None),
        RetryPolicy::default(),
    )
}

fn request(title: &str) -> DownloadRequest {
    DownloadRequest {
        clip_id: ID.to_string(),
        title: title.to_string(),
    }
}

fn wav_url() -> String {
    format!("{CDN}/{ID}.wav")
}

fn mp3_url() -> String {
    format!("{CDN}/{ID}.mp3")
}

#[tokio::test]
async fn mp3_success_saves_sanitized_filename() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().script(&mp3_url(), vec![audio(4096)]);
    let agent = agent(transport, dir.path(), None);

    let reply = agent.download(Format::Mp3, &request("Night/Drive")).await;
    assert!(reply.success, "{:?}", reply.error);
    assert_eq!(reply.filename, "Night-Drive.mp3");
    assert_eq!(reply.attempts, 1);
    assert_eq!(std::fs::read(dir.path().join("Night-Drive.mp3")).unwrap().len(), 4096);
}

#[tokio::test]
async fn mp3_error_document_is_a_single_final_failure() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().script(&mp3_url(), vec![not_ready(), audio(4096)]);
    let agent = agent(transport, dir.path(), None);

    let reply = agent.download(Format::Mp3, &request("Song")).await;
    assert!(!reply.success);
    assert_eq!(reply.attempts, 1);
    assert!(reply.error.unwrap().starts_with("MP3 download failed"));
    assert_eq!(agent.transport().gets().len(), 1);
    assert!(!dir.path().join("Song.mp3").exists());
}

#[tokio::test(start_paused = true)]
async fn wav_succeeds_on_tenth_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let mut script = vec![not_ready(); 9];
    script.push(audio(20_000));
    let transport = ScriptedTransport::new().script(&wav_url(), script);
    let agent = agent(transport, dir.path(), Some("tok"));

    let reply = agent.download(Format::Wav, &request("Long Take")).await;
    assert!(reply.success, "{:?}", reply.error);
    assert_eq!(reply.attempts, 10);
    assert_eq!(reply.filename, "Long Take.wav");
    assert_eq!(agent.transport().gets().len(), 10);
    assert_eq!(
        agent.transport().posts(),
        vec![(format!("{API}/gen/{ID}/convert_wav/"), "tok".to_string())]
    );
    assert_eq!(std::fs::read(dir.path().join("Long Take.wav")).unwrap().len(), 20_000);
}

#[tokio::test(start_paused = true)]
async fn wav_exhaustion_names_attempt_count() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().script(&wav_url(), vec![not_ready()]);
    let agent = agent(transport, dir.path(), Some("tok"));

    let reply = agent.download(Format::Wav, &request("Never")).await;
    assert!(!reply.success);
    assert_eq!(reply.attempts, 10);
    assert!(reply.error.unwrap().contains("after 10 attempts"));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test(start_paused = true)]
async fn wav_without_credential_skips_conversion_but_still_polls() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().script(&wav_url(), vec![audio(5000)]);
    let agent = agent(transport, dir.path(), None);

    let reply = agent.download(Format::Wav, &request("Ready Already")).await;
    assert!(reply.success);
    assert_eq!(reply.attempts, 1);
    assert!(agent.transport().posts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn wav_polls_even_when_conversion_request_is_refused() {
    for outcome in [PostOutcome::Status(500), PostOutcome::Unreachable] {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new()
            .post_outcome(outcome)
            .script(&wav_url(), vec![not_ready(), not_ready(), audio(8000)]);
        let agent = agent(transport, dir.path(), Some("tok"));

        let reply = agent.download(Format::Wav, &request("Stubborn")).await;
        assert!(reply.success, "{outcome:?}: {:?}", reply.error);
        assert_eq!(reply.attempts, 3);
        assert_eq!(agent.transport().posts().len(), 1);
        assert_eq!(agent.transport().gets().len(), 3);
        assert!(dir.path().join("Stubborn.wav").exists());
    }
}

#[tokio::test]
async fn conversion_request_reports_acceptance() {
    let dir = tempfile::tempdir().unwrap();
    let accepted = agent(ScriptedTransport::new(), dir.path(), Some("tok"));
    assert!(accepted.request_conversion(ID).await);

    let refused = agent(
        ScriptedTransport::new().post_outcome(PostOutcome::Status(500)),
        dir.path(),
        Some("tok"),
    );
    assert!(!refused.request_conversion(ID).await);

    let unreachable = agent(
        ScriptedTransport::new().post_outcome(PostOutcome::Unreachable),
        dir.path(),
        Some("tok"),
    );
    assert!(!unreachable.request_conversion(ID).await);
}

#[tokio::test]
async fn handle_auxiliary_actions() {
    let dir = tempfile::tempdir().unwrap();
    let agent = agent(ScriptedTransport::new(), dir.path(), Some("tok"));

    assert_eq!(
        agent.handle("getAuthToken", Value::Null).await,
        json!({"success": true, "token": "tok"})
    );
    assert_eq!(
        agent.handle("ping", Value::Null).await,
        json!({"success": true, "version": AGENT_VERSION})
    );
    assert_eq!(
        agent.handle("explode", Value::Null).await,
        json!({"success": false, "error": "Unknown action"})
    );
    let bad = agent.handle("downloadMP3", json!({"nope": 1})).await;
    assert_eq!(bad["success"], false);
}

#[tokio::test]
async fn serve_over_bridge() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().script(&mp3_url(), vec![audio(2048)]);
    let agent = agent(transport, dir.path(), None);

    let (ours, theirs) = duplex();
    let bridge = Bridge::connect(ours, Duration::from_secs(5));
    let served = tokio::spawn(agent.serve(theirs));

    assert!(bridge.wait_ready(20, Duration::from_millis(250)).await);
    let reply: DownloadReply = bridge
        .call("downloadMP3", &request("Over Bridge"))
        .await
        .unwrap();
    assert!(reply.success);
    assert!(dir.path().join("Over Bridge.mp3").exists());

    drop(bridge);
    served.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn slow_request_does_not_block_the_next_one() {
    let dir = tempfile::tempdir().unwrap();
    let other = "1f2a6c1e-93b4-4d6e-8a1f-2b3c4d5e6f70";
    let transport = ScriptedTransport::new()
        .script(&mp3_url(), vec![audio(2048)])
        .delay(&mp3_url(), Duration::from_secs(30))
        .script(&format!("{CDN}/{other}.mp3"), vec![audio(1024)]);
    let agent = agent(transport, dir.path(), None).with_call_deadline(Duration::from_secs(5));

    let (ours, theirs) = duplex();
    let bridge = Bridge::connect(ours, Duration::from_secs(5));
    tokio::spawn(agent.serve(theirs));
    assert!(bridge.wait_ready(20, Duration::from_millis(250)).await);

    let slow = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .call::<_, DownloadReply>("downloadMP3", &request("Slow"))
                .await
        })
    };
    tokio::task::yield_now().await;
    let fast: DownloadReply = bridge
        .call(
            "downloadMP3",
            &DownloadRequest {
                clip_id: other.to_string(),
                title: "Fast".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(fast.success, "{:?}", fast.error);
    if let Ok(reply) = slow.await.unwrap() {
        assert!(!reply.success);
    }

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(dir.path().join("Fast.mp3").exists());
    assert!(!dir.path().join("Slow.mp3").exists());
}

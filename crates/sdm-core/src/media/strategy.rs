//! Per-format download strategies.
//!
//! MP3 renditions exist up front and get a single attempt. WAV renditions
//! are prepared on demand: ask for a conversion, give it a head start, then
//! poll the CDN under the retry policy.

use std::future::Future;
use std::path::Path;
use tracing::{debug, info, warn};

use super::transport::HttpTransport;
use super::MediaAgent;
use crate::bridge::{DownloadReply, DownloadRequest};
use crate::catalog::Format;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::storage::ArtifactSink;
use crate::url_model::{derive_filename, media_url};

/// One way of turning a [`DownloadRequest`] into a saved artifact.
pub trait FormatStrategy: Send + Sync {
    /// Format this strategy produces.
    fn format(&self) -> Format;

    fn download<'a, T, S>(
        &'a self,
        agent: &'a MediaAgent<T, S>,
        request: &'a DownloadRequest,
    ) -> impl Future<Output = DownloadReply> + Send + 'a
    where
        T: HttpTransport,
        S: ArtifactSink;
}

fn saved_name(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

/// Single attempt against the direct MP3 URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp3Strategy;

impl FormatStrategy for Mp3Strategy {
    fn format(&self) -> Format {
        Format::Mp3
    }

    async fn download<'a, T, S>(
        &'a self,
        agent: &'a MediaAgent<T, S>,
        request: &'a DownloadRequest,
    ) -> DownloadReply
    where
        T: HttpTransport,
        S: ArtifactSink,
    {
        let filename = derive_filename(&request.title, Format::Mp3);
        let url = media_url(agent.cdn_base(), &request.clip_id, Format::Mp3);

        match agent.fetch_validate_save(&url, &filename).await {
            Ok(path) => DownloadReply {
                success: true,
                filename: saved_name(&path, &filename),
                error: None,
                attempts: 1,
            },
            Err(e) => {
                warn!(clip_id = %request.clip_id, "MP3 download failed: {}", e);
                DownloadReply {
                    success: false,
                    filename,
                    error: Some(format!("MP3 download failed: {}", e)),
                    attempts: 1,
                }
            }
        }
    }
}

/// Conversion request followed by a bounded polling loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavStrategy {
    pub policy: RetryPolicy,
}

impl FormatStrategy for WavStrategy {
    fn format(&self) -> Format {
        Format::Wav
    }

    async fn download<'a, T, S>(
        &'a self,
        agent: &'a MediaAgent<T, S>,
        request: &'a DownloadRequest,
    ) -> DownloadReply
    where
        T: HttpTransport,
        S: ArtifactSink,
    {
        let filename = derive_filename(&request.title, Format::Wav);
        let url = media_url(agent.cdn_base(), &request.clip_id, Format::Wav);

        // A failed or skipped request is not fatal: a conversion started by an
        // earlier attempt may already be running.
        agent.request_conversion(&request.clip_id).await;

        let max = self.policy.max_attempts;
        let (url_ref, name_ref) = (url.as_str(), filename.as_str());
        let outcome = run_with_retry(&self.policy, move |attempt| {
            debug!(attempt, max, "WAV fetch attempt");
            agent.fetch_validate_save(url_ref, name_ref)
        })
        .await;

        match outcome.result {
            Ok(path) => {
                info!(clip_id = %request.clip_id, attempts = outcome.attempts, "WAV downloaded");
                DownloadReply {
                    success: true,
                    filename: saved_name(&path, &filename),
                    error: None,
                    attempts: outcome.attempts,
                }
            }
            Err(e) => {
                warn!(clip_id = %request.clip_id, attempts = outcome.attempts, "WAV failed: {}", e);
                DownloadReply {
                    success: false,
                    filename,
                    error: Some(format!(
                        "WAV not ready after {} attempts: {}",
                        outcome.attempts, e
                    )),
                    attempts: outcome.attempts,
                }
            }
        }
    }
}

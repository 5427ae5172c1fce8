//! The media agent: the context that actually talks to the media service.
//!
//! It sits on the far end of the [`bridge`](crate::bridge), announces itself
//! with a `ready` message and then serves `downloadMP3`, `downloadWAV`,
//! `getAuthToken` and `ping`. Each request runs on its own task, so a slow
//! request never holds up the ones behind it.

mod auth;
mod fetch;
mod strategy;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{session_cookie_value, SessionCredentials, SESSION_COOKIE};
pub use fetch::{looks_like_error_payload, validate, ERROR_MARKERS, SMALL_BODY_LIMIT};
pub use strategy::{FormatStrategy, Mp3Strategy, WavStrategy};
pub use transport::{CurlOptions, CurlTransport, HttpResponse, HttpTransport};

use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::bridge::{
    DownloadReply, DownloadRequest, Envelope, Link, PingReply, TokenReply, ORCHESTRATOR_SOURCE,
};
use crate::catalog::Format;
use crate::config::SdmConfig;
use crate::retry::{FetchError, RetryPolicy};
use crate::storage::ArtifactSink;
use crate::url_model::conversion_url;

/// Version reported by `ping`.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where the media service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEndpoints {
    pub api_base: String,
    pub cdn_base: String,
}

/// Serves bridge requests against a transport and an artifact sink.
pub struct MediaAgent<T, S> {
    transport: T,
    sink: S,
    endpoints: MediaEndpoints,
    credentials: SessionCredentials,
    wav_policy: RetryPolicy,
    call_deadline: Option<Duration>,
}

impl<T, S> MediaAgent<T, S>
where
    T: HttpTransport,
    S: ArtifactSink,
{
    pub fn new(
        transport: T,
        sink: S,
        endpoints: MediaEndpoints,
        credentials: SessionCredentials,
        wav_policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sink,
            endpoints,
            credentials,
            wav_policy,
            call_deadline: None,
        }
    }

    /// Abandons any request still running after `deadline`. Set this to the
    /// bridge timeout so a call the caller gave up on saves nothing.
    pub fn with_call_deadline(mut self, deadline: Duration) -> Self {
        self.call_deadline = Some(deadline);
        self
    }

    /// Builds an agent from the `[media]`, `[auth]` and `[wav]` config sections.
    pub fn from_config(transport: T, sink: S, cfg: &SdmConfig) -> Self {
        Self::new(
            transport,
            sink,
            MediaEndpoints {
                api_base: cfg.media.api_base.clone(),
                cdn_base: cfg.media.cdn_base.clone(),
            },
            SessionCredentials::from_config(&cfg.auth),
            cfg.wav.policy(),
        )
    }

    pub fn cdn_base(&self) -> &str {
        &self.endpoints.cdn_base
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Shared primitive: fetch `url`, reject error documents, save as `filename`.
    pub async fn fetch_validate_save(&self, url: &str, filename: &str) -> Result<PathBuf, FetchError> {
        fetch::fetch_validate_save(&self.transport, &self.sink, url, filename).await
    }

    /// Asks the service to prepare a WAV rendition. Returns whether the
    /// request was accepted; a missing credential skips the request.
    pub async fn request_conversion(&self, clip_id: &str) -> bool {
        let Some(token) = self.credentials.resolve() else {
            info!(clip_id, "no session credential; skipping conversion request");
            return false;
        };
        let url = conversion_url(&self.endpoints.api_base, clip_id);
        match self.transport.post(&url, &token).await {
            Ok(status) => {
                debug!(clip_id, status, "conversion request sent");
                (200..300).contains(&status)
            }
            Err(e) => {
                warn!(clip_id, "conversion request failed: {}", e);
                false
            }
        }
    }

    /// Downloads one item in `format`, dispatching to that format's strategy.
    pub async fn download(&self, format: Format, request: &DownloadRequest) -> DownloadReply {
        info!(clip_id = %request.clip_id, title = %request.title, %format, "download requested");
        match format {
            Format::Mp3 => self.run_strategy(Mp3Strategy, request).await,
            Format::Wav => {
                let policy = self.wav_policy;
                self.run_strategy(WavStrategy { policy }, request).await
            }
        }
    }

    async fn run_strategy<F: FormatStrategy>(&self, strategy: F, request: &DownloadRequest) -> DownloadReply {
        debug!(format = %strategy.format(), clip_id = %request.clip_id, "dispatching to strategy");
        strategy.download(self, request).await
    }

    /// Handles one request and returns the untyped reply.
    pub async fn handle(&self, action: &str, payload: Value) -> Value {
        let format = match action {
            "downloadMP3" => Format::Mp3,
            "downloadWAV" => Format::Wav,
            "getAuthToken" => {
                let token = self.credentials.resolve();
                return to_reply(&TokenReply {
                    success: token.is_some(),
                    token,
                });
            }
            "ping" => {
                return to_reply(&PingReply {
                    success: true,
                    version: AGENT_VERSION.to_string(),
                })
            }
            other => {
                debug!(action = other, "unknown bridge action");
                return json!({ "success": false, "error": "Unknown action" });
            }
        };

        let reply = match serde_json::from_value::<DownloadRequest>(payload) {
            Ok(request) => self.download(format, &request).await,
            Err(e) => DownloadReply {
                success: false,
                filename: String::new(),
                error: Some(format!("invalid request: {}", e)),
                attempts: 1,
            },
        };
        to_reply(&reply)
    }

    /// Announces readiness, then serves requests until the link closes.
    pub async fn serve(self, mut link: Link) {
        if link.tx.send(envelope_value(Envelope::ready())).is_err() {
            return;
        }
        info!("media agent ready");

        let agent = Arc::new(self);
        while let Some(raw) = link.rx.recv().await {
            let Some(env) = Envelope::from_value(raw, ORCHESTRATOR_SOURCE) else {
                continue;
            };
            debug!(action = %env.action, request_id = ?env.request_id, "agent received");
            let agent = Arc::clone(&agent);
            let tx = link.tx.clone();
            tokio::spawn(async move {
                let result = agent.handle_within_deadline(&env.action, env.payload).await;
                if tx
                    .send(envelope_value(Envelope::response(env.request_id, result)))
                    .is_err()
                {
                    debug!(request_id = ?env.request_id, "link closed before reply");
                }
            });
        }
        debug!("media agent stopped");
    }

    async fn handle_within_deadline(&self, action: &str, payload: Value) -> Value {
        let Some(deadline) = self.call_deadline else {
            return self.handle(action, payload).await;
        };
        match tokio::time::timeout(deadline, self.handle(action, payload)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(action, "request abandoned after {}s", deadline.as_secs());
                json!({
                    "success": false,
                    "error": format!("abandoned after {}s", deadline.as_secs()),
                })
            }
        }
    }
}

fn to_reply<R: serde::Serialize>(reply: &R) -> Value {
    serde_json::to_value(reply)
        .unwrap_or_else(|e| json!({ "success": false, "error": e.to_string() }))
}

fn envelope_value(env: Envelope) -> Value {
    serde_json::to_value(env).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests;

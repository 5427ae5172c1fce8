//! Wire envelope and typed payloads carried over the untyped bridge transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// `source` of messages sent by the orchestrator side.
pub const ORCHESTRATOR_SOURCE: &str = "sdm-orchestrator";
/// `source` of messages sent by the agent side.
pub const AGENT_SOURCE: &str = "sdm-agent";
/// Unsolicited action the agent sends once when it comes up.
pub const READY_ACTION: &str = "ready";
/// Action used for every reply.
pub const RESPONSE_ACTION: &str = "response";

/// One message on the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub source: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub result: Value,
}

impl Envelope {
    pub fn request(action: &str, request_id: u64, payload: Value) -> Self {
        Self {
            source: ORCHESTRATOR_SOURCE.to_string(),
            action: action.to_string(),
            request_id: Some(request_id),
            payload,
            result: Value::Null,
        }
    }

    pub fn response(request_id: Option<u64>, result: Value) -> Self {
        Self {
            source: AGENT_SOURCE.to_string(),
            action: RESPONSE_ACTION.to_string(),
            request_id,
            payload: Value::Null,
            result,
        }
    }

    pub fn ready() -> Self {
        Self {
            source: AGENT_SOURCE.to_string(),
            action: READY_ACTION.to_string(),
            request_id: None,
            payload: Value::Null,
            result: Value::Null,
        }
    }

    /// Parses a raw message, returning `None` for anything that is not an
    /// envelope from `source` (both sides share one channel, like a page's
    /// message bus, and ignore foreign traffic).
    pub fn from_value(raw: Value, source: &str) -> Option<Self> {
        let env: Envelope = serde_json::from_value(raw).ok()?;
        (env.source == source).then_some(env)
    }
}

/// One end of an untyped, bidirectional message transport.
#[derive(Debug)]
pub struct Link {
    pub tx: mpsc::UnboundedSender<Value>,
    pub rx: mpsc::UnboundedReceiver<Value>,
}

/// Creates a connected pair of links: whatever one end sends, the other receives.
pub fn duplex() -> (Link, Link) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (Link { tx: a_tx, rx: a_rx }, Link { tx: b_tx, rx: b_rx })
}

/// Payload of `downloadMP3` / `downloadWAV`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub clip_id: String,
    pub title: String,
}

/// Reply to `downloadMP3` / `downloadWAV`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReply {
    pub success: bool,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Fetch attempts spent on the item.
    #[serde(default = "one")]
    pub attempts: u32,
}

fn one() -> u32 {
    1
}

/// Reply to `getAuthToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenReply {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
}

/// Reply to `ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingReply {
    pub success: bool,
    pub version: String,
}

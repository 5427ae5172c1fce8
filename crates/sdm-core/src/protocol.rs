//! Control protocol: one JSON object per line over the control socket.
//!
//! `{"action":"ping"}` → `{"status":"ok","version":"..."}`
//! `{"action":"stopDownload"}` → `{"status":"stopped"}`

use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "ok";
pub const STATUS_STOPPED: &str = "stopped";
pub const STATUS_ERROR: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlRequest {
    Ping,
    StopDownload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlReply {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Whether a download run was active when the request arrived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ControlReply {
    pub fn ok(version: &str, active: bool) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            version: Some(version.to_string()),
            active: Some(active),
            error: None,
        }
    }

    pub fn stopped() -> Self {
        Self {
            status: STATUS_STOPPED.to_string(),
            version: None,
            active: None,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            version: None,
            active: None,
            error: Some(msg.into()),
        }
    }
}

/// Parses one request line; surrounding whitespace is ignored.
pub fn parse_request(line: &str) -> Result<ControlRequest, serde_json::Error> {
    serde_json::from_str(line.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_lines() {
        assert_eq!(parse_request("{\"action\":\"ping\"}\n").unwrap(), ControlRequest::Ping);
        assert_eq!(
            parse_request(r#"{"action":"stopDownload"}"#).unwrap(),
            ControlRequest::StopDownload
        );
        assert!(parse_request(r#"{"action":"explode"}"#).is_err());
        assert_eq!(
            serde_json::to_value(ControlRequest::StopDownload).unwrap(),
            json!({"action": "stopDownload"})
        );
    }

    #[test]
    fn reply_shapes() {
        assert_eq!(
            serde_json::to_value(ControlReply::stopped()).unwrap(),
            json!({"status": "stopped"})
        );
        assert_eq!(
            serde_json::to_value(ControlReply::ok("0.1.0", true)).unwrap(),
            json!({"status": "ok", "version": "0.1.0", "active": true})
        );
    }
}

//! Control socket: server (during `sdm download`) and client (`sdm stop`, `sdm ping`).
//! Protocol: one JSON request per line, one JSON reply per line.

use anyhow::{Context, Result};
use sdm_core::protocol::{parse_request, ControlReply, ControlRequest};
use sdm_core::session::Session;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

fn reply_line(reply: &ControlReply) -> String {
    let mut line = serde_json::to_string(reply)
        .unwrap_or_else(|e| format!("{{\"status\":\"error\",\"error\":\"{}\"}}", e));
    line.push('\n');
    line
}

async fn serve_connection(session: Arc<Session>, stream: UnixStream) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match parse_request(&line) {
            Ok(request) => {
                tracing::debug!(?request, "control request");
                session.handle_control(request)
            }
            Err(e) => ControlReply::error(format!("bad request: {}", e)),
        };
        if write.write_all(reply_line(&reply).as_bytes()).await.is_err() {
            break;
        }
    }
}

/// Binds `path` (replacing a stale socket) and serves control requests
/// against `session` on a background task.
pub fn spawn_control_listener(
    session: Arc<Session>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)
        .with_context(|| format!("bind control socket: {}", path.display()))?;

    Ok(tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    tokio::spawn(serve_connection(Arc::clone(&session), stream));
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    }))
}

/// Sends one request and waits for its reply. `None` when nothing is
/// listening (no socket, or a stale one).
pub async fn send_request(socket_path: &Path, request: ControlRequest) -> Result<Option<ControlReply>> {
    if !socket_path.exists() {
        return Ok(None);
    }
    let stream = match UnixStream::connect(socket_path).await {
        Ok(s) => s,
        Err(e) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::NotFound) => {
            return Ok(None)
        }
        Err(e) => return Err(e.into()),
    };
    let (read, mut write) = stream.into_split();

    let mut msg = serde_json::to_string(&request)?;
    msg.push('\n');
    write.write_all(msg.as_bytes()).await?;

    let line = BufReader::new(read)
        .lines()
        .next_line()
        .await?
        .context("control socket closed without a reply")?;
    Ok(Some(serde_json::from_str(&line)?))
}

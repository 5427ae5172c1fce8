//! Request/response bridge to the media agent.
//!
//! The agent runs in its own context and is reached only through an untyped
//! message transport ([`Link`]). [`Bridge::call`] turns that into an async
//! call: each request gets a correlation id, a slot in the pending table and
//! its own timeout.
//!
//! ```text
//!   Bridge::call(action, payload)
//!         ├── pending[id] = oneshot      → Envelope{requestId: id} → link.tx
//!         └── await oneshot (timeout)
//!
//!   reader task ← link.rx
//!         ├── action "ready"             → ready flag
//!         └── action "response" + id     → pending[id].send(result)
//! ```

mod envelope;
mod error;

pub use envelope::{
    duplex, DownloadReply, DownloadRequest, Envelope, Link, PingReply, TokenReply, AGENT_SOURCE,
    ORCHESTRATOR_SOURCE, READY_ACTION, RESPONSE_ACTION,
};
pub use error::BridgeError;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

type PendingTable = HashMap<u64, oneshot::Sender<Value>>;

/// State shared with the reader task. Holds no sender, so dropping every
/// [`Bridge`] closes the outbound side and lets the agent shut down.
#[derive(Default)]
struct Shared {
    pending: Mutex<PendingTable>,
    ready: AtomicBool,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cloneable handle for calling into the agent.
#[derive(Clone)]
pub struct Bridge {
    outbound: mpsc::UnboundedSender<Value>,
    shared: Arc<Shared>,
    next_id: Arc<AtomicU64>,
    timeout: Duration,
}

impl Bridge {
    /// Attaches to one end of a link and spawns the reader task.
    /// Must be called inside a tokio runtime.
    pub fn connect(link: Link, timeout: Duration) -> Self {
        let shared = Arc::new(Shared::default());
        tokio::spawn(reader_task(link.rx, Arc::clone(&shared)));
        Self {
            outbound: link.tx,
            shared,
            next_id: Arc::new(AtomicU64::new(1)),
            timeout,
        }
    }

    /// Whether the agent has announced itself.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Acquire)
    }

    /// Polls the readiness flag up to `attempts` times, `interval` apart.
    pub async fn wait_ready(&self, attempts: u32, interval: Duration) -> bool {
        if self.is_ready() {
            return true;
        }
        for _ in 0..attempts {
            tokio::time::sleep(interval).await;
            if self.is_ready() {
                return true;
            }
        }
        false
    }

    /// Number of calls still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.shared.pending().len()
    }

    /// Sends `action` with `payload` and waits for the correlated reply.
    ///
    /// A reply that does not arrive within the bridge timeout fails this call
    /// only; its pending slot is released and a late reply is dropped.
    pub async fn call<P, R>(&self, action: &str, payload: &P) -> Result<R, BridgeError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = Envelope::request(action, request_id, serde_json::to_value(payload)?);
        let raw = serde_json::to_value(&envelope)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.shared.pending().insert(request_id, reply_tx);
        debug!(request_id, action, "bridge request");

        if self.outbound.send(raw).is_err() {
            self.shared.pending().remove(&request_id);
            return Err(BridgeError::Disconnected);
        }

        let result = match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => return Err(BridgeError::Disconnected),
            Err(_) => {
                self.shared.pending().remove(&request_id);
                warn!(request_id, action, "bridge request timed out");
                return Err(BridgeError::Timeout {
                    action: action.to_string(),
                    after: self.timeout,
                });
            }
        };

        serde_json::from_value(result).map_err(|source| BridgeError::Malformed {
            action: action.to_string(),
            source,
        })
    }
}

async fn reader_task(mut rx: mpsc::UnboundedReceiver<Value>, shared: Arc<Shared>) {
    while let Some(raw) = rx.recv().await {
        let Some(env) = Envelope::from_value(raw, AGENT_SOURCE) else {
            continue;
        };

        if env.action == READY_ACTION {
            debug!("bridge agent is ready");
            shared.ready.store(true, Ordering::Release);
            continue;
        }

        let Some(request_id) = env.request_id else {
            debug!(action = %env.action, "bridge message without request id");
            continue;
        };
        match shared.pending().remove(&request_id) {
            Some(tx) => {
                debug!(request_id, "bridge response");
                let _ = tx.send(env.result);
            }
            None => debug!(request_id, "bridge response for unknown or expired request"),
        }
    }

    debug!("bridge transport closed");
    shared.ready.store(false, Ordering::Release);
    // Dropping the senders fails every outstanding call with Disconnected.
    shared.pending().clear();
}

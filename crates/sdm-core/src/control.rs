//! Run control: the single-run flag and the cooperative stop token.
//!
//! A download run holds [`RunControl`] for its whole lifetime. `stop` only
//! raises the token; the run loop checks it between items and leaves on its
//! own, and the active flag drops when its [`ActiveRun`] guard does.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared active flag and stop token.
#[derive(Debug, Default)]
pub struct RunControl {
    active: AtomicBool,
    stop: AtomicBool,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the run slot. Returns `None` when a run is already active.
    /// Clears any stop request left over from the previous run.
    pub fn try_begin(self: &Arc<Self>) -> Option<ActiveRun> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.stop.store(false, Ordering::Release);
        Some(ActiveRun {
            control: Arc::clone(self),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Asks the active run to stop before its next item.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Holds the run slot; releases it when dropped.
#[derive(Debug)]
pub struct ActiveRun {
    control: Arc<RunControl>,
}

impl ActiveRun {
    pub fn stop_requested(&self) -> bool {
        self.control.stop_requested()
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.control.active.store(false, Ordering::Release);
    }
}

/// Default path for the control socket (same XDG state dir as the log).
pub fn default_control_socket_path() -> Result<PathBuf> {
    Ok(crate::logging::state_dir()?.join("control.sock"))
}

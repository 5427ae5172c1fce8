use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Environment variable that overrides `[auth].session_token`.
pub const SESSION_TOKEN_ENV: &str = "SDM_SESSION_TOKEN";

/// Scroll-and-harvest parameters (`[scan]` in config.toml).
///
/// The three stall thresholds count consecutive iterations without catalog
/// growth; they must be increasing for every recovery to get its turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Pixels advanced per scroll step.
    pub scroll_step_px: u32,
    /// Wait after each scroll step for newly visible rows to mount.
    pub settle_delay_ms: u64,
    /// Wait after the initial reset to the top.
    pub initial_settle_ms: u64,
    /// Upper bound on scroll iterations.
    pub max_iterations: u32,
    /// Stalled iterations before jumping to the bottom extent.
    pub bottom_jump_after: u32,
    /// Stalled iterations before jumping back to the top.
    pub top_jump_after: u32,
    /// Stalled iterations before giving up with a partial catalog.
    pub give_up_after: u32,
    /// Wait after a jump to the bottom extent.
    pub bottom_settle_ms: u64,
    /// Wait after a jump to the top extent.
    pub top_settle_ms: u64,
    /// Wait before the final harvest at the top.
    pub final_settle_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scroll_step_px: 600,
            settle_delay_ms: 800,
            initial_settle_ms: 500,
            max_iterations: 200,
            bottom_jump_after: 4,
            top_jump_after: 6,
            give_up_after: 8,
            bottom_settle_ms: 1000,
            top_settle_ms: 500,
            final_settle_ms: 300,
        }
    }
}

/// Download orchestration parameters (`[download]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Pause between consecutive items.
    pub inter_item_delay_ms: u64,
    /// Timeout for a single bridge request.
    pub request_timeout_secs: u64,
    /// How many times to poll for the bridge readiness signal.
    pub ready_poll_attempts: u32,
    /// Interval between readiness polls.
    pub ready_poll_interval_ms: u64,
    /// Where artifacts are saved; `None` = current directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: 3000,
            request_timeout_secs: 180,
            ready_poll_attempts: 20,
            ready_poll_interval_ms: 250,
            output_dir: None,
        }
    }
}

/// WAV preparation retry parameters (`[wav]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of fetch attempts (including the first).
    pub max_attempts: u32,
    /// Head start given to server-side conversion before the first attempt.
    pub first_delay_ms: u64,
    /// Wait between failed attempts.
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            first_delay_ms: 6000,
            retry_delay_ms: 4000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.first_delay_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Remote media service endpoints (`[media]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub api_base: String,
    pub cdn_base: String,
    pub connect_timeout_secs: u64,
    pub transfer_timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            api_base: "https://studio-api.prod.suno.com/api".to_string(),
            cdn_base: "https://cdn1.suno.ai".to_string(),
            connect_timeout_secs: 30,
            transfer_timeout_secs: 600,
        }
    }
}

/// Session credentials used for conversion requests (`[auth]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token taken from a signed-in page session.
    pub session_token: Option<String>,
    /// Raw `Cookie` header; its `__session` value is used when no token is set.
    pub cookie: Option<String>,
}

/// Global configuration loaded from `~/.config/sdm/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdmConfig {
    pub scan: ScanConfig,
    pub download: DownloadConfig,
    pub wav: RetryConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
}

impl SdmConfig {
    /// Applies environment overrides (currently only the session token).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var(SESSION_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.auth.session_token = Some(token.trim().to_string());
            }
        }
        self
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg.with_env_overrides());
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SdmConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg.with_env_overrides())
}

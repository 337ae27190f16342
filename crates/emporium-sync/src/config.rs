//! # Sync Configuration
//!
//! Settings for the sync engine. They live in the `[sync]` table of the
//! panel's config file.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     EMPORIUM_SYNC_ENABLED=false                                         │
//! │     EMPORIUM_SYNC_INTERVAL_SECS=30                                      │
//! │                                                                         │
//! │  2. TOML Config File, [sync] table                                      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     enabled, every 60s, 10s per store call                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [sync]
//! enabled = true
//! auto_start = true
//! interval_secs = 60
//! op_timeout_secs = 10
//! cache_path = "data/cache.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// Sync behavior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Whether the panel builds a sync engine at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Start the schedule as soon as the engine is built.
    #[serde(default = "default_true")]
    pub auto_start: bool,

    /// Interval between scheduled passes (seconds).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Bound on each store call made during a pass (seconds).
    #[serde(default = "default_op_timeout")]
    pub op_timeout_secs: u64,

    /// Local cache database kept in step with the main store.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    60
}

fn default_op_timeout() -> u64 {
    10
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/cache.db")
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            enabled: default_true(),
            auto_start: default_true(),
            interval_secs: default_interval(),
            op_timeout_secs: default_op_timeout(),
            cache_path: default_cache_path(),
        }
    }
}

impl SyncSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }

    /// Validates the settings.
    pub fn validate(&self) -> SyncResult<()> {
        if self.interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "interval_secs must be greater than 0".into(),
            ));
        }

        if self.op_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "op_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.cache_path.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig("cache_path must not be empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("EMPORIUM_SYNC_ENABLED") {
            match parse_flag(&enabled) {
                Some(flag) => {
                    debug!(enabled = flag, "Overriding sync enabled from environment");
                    self.enabled = flag;
                }
                None => warn!(value = %enabled, "Unknown EMPORIUM_SYNC_ENABLED value"),
            }
        }

        if let Ok(interval) = std::env::var("EMPORIUM_SYNC_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse::<u64>() {
                debug!(secs, "Overriding sync interval from environment");
                self.interval_secs = secs;
            }
        }

        if let Ok(timeout) = std::env::var("EMPORIUM_SYNC_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.op_timeout_secs = secs;
            }
        }

        if let Ok(path) = std::env::var("EMPORIUM_CACHE_PATH") {
            debug!(path = %path, "Overriding sync cache path from environment");
            self.cache_path = PathBuf::from(path);
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

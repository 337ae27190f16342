//! # Panel Configuration
//!
//! Everything the panel reads at startup, in one TOML file.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     PORT=8080  SECRET_KEY=...  EMPORIUM_DB_PATH=/srv/emporium.db        │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     --config <path>, or                                                 │
//! │     ~/.config/emporium-panel/panel.toml (Linux)                         │
//! │     ~/Library/Application Support/com.emporium.panel/panel.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! port = 5000
//! secret_key = "change-me"
//!
//! [store]
//! database_path = "data/emporium.db"
//! op_timeout_secs = 10
//!
//! [auth]
//! session_lifetime_secs = 1800
//! username = "admin"
//! password = "admin123"
//!
//! [uploads]
//! dir = "uploads"
//! max_bytes = 16777216
//!
//! [sync]
//! enabled = true
//! interval_secs = 60
//! cache_path = "data/cache.db"
//! ```

use emporium_sync::SyncSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Signing key used when none is configured. Startup warns about it.
pub const DEVELOPMENT_SECRET_KEY: &str = "emporium-dev-secret-change-in-production";

/// Largest accepted upload: 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port the web layer listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// HS256 key for session tokens.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Bound on each store call made by a command (seconds).
    #[serde(default = "default_op_timeout")]
    pub op_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: u64,

    /// Credential pair used when no users table is reachable, and for the
    /// first admin user of an empty store.
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default = "default_display_name")]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_port() -> u16 {
    5000
}

fn default_secret_key() -> String {
    DEVELOPMENT_SECRET_KEY.to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/emporium.db")
}

fn default_op_timeout() -> u64 {
    10
}

fn default_session_lifetime() -> u64 {
    1800
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin123".to_string()
}

fn default_display_name() -> String {
    "Administrador".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            port: default_port(),
            secret_key: default_secret_key(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            database_path: default_database_path(),
            op_timeout_secs: default_op_timeout(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            session_lifetime_secs: default_session_lifetime(),
            username: default_username(),
            password: default_password(),
            display_name: default_display_name(),
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        UploadSettings {
            dir: default_upload_dir(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl StoreSettings {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }
}

impl AuthSettings {
    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime_secs)
    }
}

// =============================================================================
// Panel Config
// =============================================================================

/// Complete panel configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub uploads: UploadSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl PanelConfig {
    /// Loads configuration from file, then applies environment overrides.
    ///
    /// ## Arguments
    /// * `config_path` - Explicit file; `None` uses the platform config dir
    ///
    /// A missing file is not an error: defaults apply.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading panel config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Like [`load`](Self::load), falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load panel config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Panel config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be greater than 0".into()));
        }

        if self.server.secret_key.trim().is_empty() {
            return Err(ConfigError::Invalid("server.secret_key must not be empty".into()));
        }

        if self.store.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store.database_path must not be empty".into()));
        }

        if self.store.op_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "store.op_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.auth.session_lifetime_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.session_lifetime_secs must be greater than 0".into(),
            ));
        }

        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.username and auth.password must not be empty".into(),
            ));
        }

        if self.uploads.max_bytes == 0 {
            return Err(ConfigError::Invalid("uploads.max_bytes must be greater than 0".into()));
        }

        self.sync
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }

    /// `true` while the built-in signing key is in use.
    pub fn uses_development_key(&self) -> bool {
        self.server.secret_key == DEVELOPMENT_SECRET_KEY
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid PORT"),
            }
        }

        if let Ok(key) = std::env::var("SECRET_KEY") {
            debug!("Overriding secret key from environment");
            self.server.secret_key = key;
        }

        if let Ok(path) = std::env::var("EMPORIUM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = PathBuf::from(path);
        }

        if let Ok(secs) = std::env::var("EMPORIUM_OP_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                self.store.op_timeout_secs = secs;
            }
        }

        if let Ok(secs) = std::env::var("EMPORIUM_SESSION_LIFETIME_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                self.auth.session_lifetime_secs = secs;
            }
        }

        if let Ok(user) = std::env::var("EMPORIUM_ADMIN_USER") {
            self.auth.username = user;
        }

        if let Ok(password) = std::env::var("EMPORIUM_ADMIN_PASSWORD") {
            self.auth.password = password;
        }

        if let Ok(dir) = std::env::var("UPLOAD_FOLDER") {
            debug!(dir = %dir, "Overriding upload folder from environment");
            self.uploads.dir = PathBuf::from(dir);
        }

        if let Ok(bytes) = std::env::var("EMPORIUM_MAX_UPLOAD_BYTES") {
            if let Ok(bytes) = bytes.parse::<u64>() {
                self.uploads.max_bytes = bytes;
            }
        }

        self.sync.apply_env_overrides();
    }

    /// `panel.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "emporium", "panel")
            .map(|dirs| dirs.config_dir().join("panel.toml"))
    }

}

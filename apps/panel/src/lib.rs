//! # Emporium Panel
//!
//! Back office for a small shop: customers, categories, products with
//! stock, and sales, plus a background sync between the main store and a
//! local cache.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Emporium Panel                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  commands::*   one typed function per panel action               │  │
//! │  │  (login, CRUD, stock, sales, reports, sync control, images)      │  │
//! │  └───────────────────────────────┬──────────────────────────────────┘  │
//! │                                  │ &AppContext, &Identity              │
//! │  ┌───────────────┐  ┌────────────▼───────┐  ┌───────────────────────┐  │
//! │  │   AuthGate    │  │ EntityStore        │  │  SyncEngine           │  │
//! │  │ JWT sessions  │  │ StockLedger        │  │  cache ◄──► main      │  │
//! │  │ argon2 users  │  │ (emporium-db)      │  │  (emporium-sync)      │  │
//! │  └───────────────┘  └────────────┬───────┘  └───────────┬───────────┘  │
//! │                                  │                      │              │
//! │                                  ▼                      ▼              │
//! │                      SQLite main store          SQLite cache           │
//! │                      (NullStore when down)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! `panel.toml` (see [`config`]), overridden by environment variables:
//! - `PORT` - listen port (default: 5000)
//! - `SECRET_KEY` - session signing key
//! - `EMPORIUM_DB_PATH` - main store file
//! - `UPLOAD_FOLDER` - image directory
//! - `EMPORIUM_SYNC_*` - sync engine settings

pub mod auth;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod uploads;

// Re-exports
pub use auth::{AuthError, AuthGate, Identity};
pub use config::{ConfigError, PanelConfig};
pub use context::AppContext;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use uploads::{BlobStore, FsBlobStore, UploadError};

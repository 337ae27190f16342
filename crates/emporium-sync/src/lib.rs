//! # emporium-sync: Sync Engine for Emporium
//!
//! Keeps the panel's local cache database and the main store converged.
//! The panel keeps working against whichever store it was given; the
//! engine copies records between the two in the background.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      SyncEngine                                  │  │
//! │  │                                                                  │  │
//! │  │  Spawned scheduler task, one tick per interval                   │  │
//! │  │  force_sync() for on-demand passes                               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ one pass at a time                      │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      reconcile_all                               │  │
//! │  │                                                                  │  │
//! │  │  category → customer → product → sale → sale_item                │  │
//! │  │  per kind: fetch both sides, plan(), upsert the differences      │  │
//! │  └──────────────┬───────────────────────────────────┬───────────────┘  │
//! │                 ▼                                   ▼                   │
//! │        local store (cache)                  remote store (main)         │
//! │                                                                         │
//! │  STATUS: SyncRecord (state, last success, last error, counts)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`engine`] - `SyncEngine`, its scheduler and builder
//! - [`reconcile`] - Pure planning and the per-kind pass
//! - [`config`] - `SyncSettings`
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporium_sync::{SyncEngineBuilder, SyncSettings};
//!
//! let engine = SyncEngineBuilder::new(SyncSettings::default())
//!     .with_local(cache)
//!     .with_remote(main_store)
//!     .build()?;
//!
//! engine.start().await;
//! let counts = engine.force_sync().await?;
//! println!("pulled {}", counts.pulled);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod reconcile;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::SyncSettings;
pub use engine::{NoOpEmitter, PassOutcome, SyncEngine, SyncEngineBuilder, SyncEventEmitter};
pub use error::{SyncError, SyncResult};
pub use reconcile::{plan, reconcile_all, Plan};

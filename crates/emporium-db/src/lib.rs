//! # emporium-db: Store Layer for Emporium
//!
//! Persistence for the administration panel: SQLite through sqlx, the
//! entity store facade, the stock ledger and the reports built on them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Data Flow                               │
//! │                                                                         │
//! │  Panel command (update_product)          SyncEngine pass                │
//! │       │                                        │                        │
//! │       ▼                                        │                        │
//! │  ┌─────────────────────────────────────────────┼───────────────────┐   │
//! │  │                  emporium-db (THIS CRATE)   │                   │   │
//! │  │                                             ▼                   │   │
//! │  │   EntityStore / StockLedger ──► StoreHandle (Arc<dyn Store>)    │   │
//! │  │   (timeouts, validation,              │                         │   │
//! │  │    revision retries)        ┌─────────┴──────────┐              │   │
//! │  │                             ▼                    ▼              │   │
//! │  │                    Database (pool.rs)      NullStore            │   │
//! │  │                    repositories, WAL       degraded mode        │   │
//! │  │                    embedded migrations                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   data/emporium.db  (store)     data/cache.db  (sync cache)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table repositories
//! - [`store`] - The `Store` trait and handle
//! - [`null`] - Null store for degraded mode
//! - [`entities`] - CRUD facade with timeouts
//! - [`ledger`] - Stock quantities
//! - [`report`] - Sales report and dashboard counts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporium_db::{Database, DbConfig, EntityStore, StockLedger};
//!
//! let db = Database::new(DbConfig::new("data/emporium.db")).await?;
//! let store: StoreHandle = Arc::new(db);
//!
//! let entities = EntityStore::new(store.clone());
//! let ledger = StockLedger::new(store);
//!
//! let id = entities.products().create(draft).await?;
//! ledger.adjust_quantity(&id, -2).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entities;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod null;
pub mod pool;
pub mod report;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use entities::{bounded, Collection, EntityStore, DEFAULT_OP_TIMEOUT};
pub use error::{DbError, DbResult};
pub use ledger::StockLedger;
pub use null::NullStore;
pub use pool::{Database, DbConfig};
pub use report::{dashboard_counts, sales_report, DashboardCounts, SaleSummary};
pub use store::{Store, StoreHandle, StoreKind, Stored};

// Repository re-exports for convenience
pub use repository::{Repository, StockChange, StockRepository, UserRepository};

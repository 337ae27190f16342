//! # emporium-core: Domain Logic for the Emporium Panel
//!
//! Records, inputs, validation and money for the administration panel,
//! as pure code with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Emporium Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 panel (commands, auth gate, uploads)            │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────┐   ┌───────────────▼───────────────┐   │
//! │  │  emporium-db                │◄──│  emporium-sync                │   │
//! │  │  EntityStore, StockLedger   │   │  SyncEngine (local ⇄ remote)  │   │
//! │  └──────────────┬──────────────┘   └───────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────────────────────▼───────────────┐   │
//! │  │               ★ emporium-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │  entity   │  │   input   │  │ validation│   │   │
//! │  │   │  Product  │  │  Entity   │  │  Draft    │  │   rules   │   │   │
//! │  │   │   Sale    │  │  trait    │  │  Patch    │  │           │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Customer, Category, Product, Sale, SaleItem, User)
//! - [`entity`] - The `Entity` trait and `EntityKind`
//! - [`input`] - Drafts, partial patches and filters
//! - [`money`] - Integer money with decimal parsing
//! - [`validation`] - Field validators
//! - [`sync`] - Sync status record
//! - [`error`] - `ValidationError` and the shared `ErrorKind`
//!
//! ## Example Usage
//!
//! ```rust
//! use emporium_core::{Entity, Product, ProductDraft, ProductPatch};
//!
//! let draft = ProductDraft {
//!     name: "Café 500g".into(),
//!     price_cents: "18,90".parse::<emporium_core::Money>().unwrap().cents(),
//!     quantity: 10,
//!     ..Default::default()
//! };
//! let mut product = Product::from_draft("p-1".into(), draft, emporium_core::now()).unwrap();
//!
//! let patch = ProductPatch { name: Some("Café 1kg".into()), ..Default::default() };
//! assert!(product.apply_patch(&patch).unwrap());
//! assert_eq!(product.quantity, 10);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entity;
pub mod error;
pub mod input;
pub mod money;
pub mod sync;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use entity::{Entity, EntityKind, Link};
pub use error::{ErrorKind, ValidationError};
pub use input::*;
pub use money::{parse_price_cents, Money};
pub use sync::{SyncCounts, SyncRecord, SyncState};
pub use types::*;
pub use validation::ValidationResult;

use chrono::{DateTime, SubsecRound, Utc};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a display name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Category name shown for products without a (valid) category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Current time at microsecond precision.
///
/// Timestamps are compared after round-trips through SQLite and JSON, so
/// every record timestamp is produced here.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// New store-assigned identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

//! # Repository Module
//!
//! Per-table access behind object-safe traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  EntityStore / StockLedger / SyncEngine                                 │
//! │       │                                                                 │
//! │       │  store.products().fetch(id)                                     │
//! │       ▼                                                                 │
//! │  dyn Repository<Product> ──┬── ProductRepository  (SQLite, sqlx)        │
//! │                            └── NullRepository     (degraded mode)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories are dumb: no validation, no timestamps. They persist exactly
//! the record they are given. The entity store owns the rules.
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`], [`CategoryRepository`]
//! - [`ProductRepository`] - also implements [`StockRepository`]
//! - [`SaleRepository`], [`SaleItemRepository`]
//! - [`UserRepository`] (trait) / [`SqliteUserRepository`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emporium_core::{Entity, StockEntry, User};

use crate::error::{DbError, DbResult};

pub mod category;
pub mod customer;
pub mod product;
pub mod sale;
pub mod user;

pub use category::CategoryRepository;
pub use customer::CustomerRepository;
pub use product::ProductRepository;
pub use sale::{SaleItemRepository, SaleRepository};
pub use user::SqliteUserRepository;

/// A sqlx query with SQLite arguments, for shared bind helpers.
pub(crate) type SqliteQuery<'q> =
    sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

// =============================================================================
// Repository
// =============================================================================

/// Storage for one entity type.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn fetch(&self, id: &str) -> DbResult<Option<E>>;

    async fn fetch_all(&self) -> DbResult<Vec<E>>;

    /// Inserts a new row. Fails with `UniqueViolation` if the id exists.
    async fn insert(&self, entity: &E) -> DbResult<()>;

    /// Overwrites the row only if its stored revision is still
    /// `expected_revision`.
    ///
    /// ## Returns
    /// * `Ok(true)` - Row replaced
    /// * `Ok(false)` - Row missing or revision moved on
    async fn replace(&self, entity: &E, expected_revision: i64) -> DbResult<bool>;

    /// Inserts or overwrites the row verbatim, revision included.
    ///
    /// Uses `ON CONFLICT(id) DO UPDATE`, never `INSERT OR REPLACE`: a
    /// replace deletes the old row first and would cascade to sale items.
    async fn upsert(&self, entity: &E) -> DbResult<()>;

    /// Deletes the row unless other records reference it.
    ///
    /// ## Returns
    /// * `Ok(true)` - Row deleted
    /// * `Ok(false)` - No such row
    /// * `Err(DbError::Referenced)` - Row kept, still referenced
    async fn remove(&self, id: &str) -> DbResult<bool>;

    /// Number of records in other tables that forbid deleting `id`.
    async fn count_references(&self, id: &str) -> DbResult<u64>;

    async fn count(&self) -> DbResult<u64>;

    async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.fetch(id).await?.is_some())
    }
}

/// Interprets the row count of a guarded `DELETE ... AND NOT EXISTS (..)`.
///
/// Zero rows means either the row is missing or a reference blocked it.
pub(crate) async fn guarded_delete_outcome<E, R>(repo: &R, id: &str, rows_affected: u64) -> DbResult<bool>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    if rows_affected > 0 {
        return Ok(true);
    }
    if !repo.exists(id).await? {
        return Ok(false);
    }

    let count = repo.count_references(id).await?;
    Err(DbError::Referenced {
        entity: E::KIND.label().to_string(),
        id: id.to_string(),
        count,
    })
}

// =============================================================================
// Stock
// =============================================================================

/// Result of a conditional stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    /// Applied; carries the new quantity.
    Applied(i64),
    /// Refused because the result would be negative; nothing changed.
    Rejected { current: i64 },
}

/// Atomic quantity operations on products.
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Adds `delta` in a single conditional UPDATE.
    ///
    /// Fails with `NotFound` if the product does not exist.
    async fn apply_delta(
        &self,
        product_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<StockChange>;

    /// Sets an absolute quantity. The caller validates `quantity >= 0`.
    async fn set_quantity(&self, product_id: &str, quantity: i64, now: DateTime<Utc>)
        -> DbResult<i64>;

    async fn quantity(&self, product_id: &str) -> DbResult<Option<i64>>;

    /// Every product with its category name resolved.
    async fn report(&self) -> DbResult<Vec<StockEntry>>;
}

// =============================================================================
// Users
// =============================================================================

/// Panel users, for the store-backed credential store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Exact, case-sensitive lookup.
    async fn find_by_username(&self, username: &str) -> DbResult<Option<User>>;

    async fn insert(&self, user: &User) -> DbResult<()>;

    async fn count(&self) -> DbResult<u64>;
}

//! # Store Abstraction
//!
//! A `Store` bundles one repository per table. Two implementations exist:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            StoreHandle = Arc<dyn Store>                                 │
//! │                    │                                                    │
//! │        ┌───────────┴────────────┐                                       │
//! │        ▼                        ▼                                       │
//! │   Database (live)          NullStore (degraded)                         │
//! │   SQLite via sqlx          reads: empty / None                          │
//! │                            writes: DbError::Unavailable                 │
//! │                                                                         │
//! │  Chosen once at startup. Call sites never branch on availability.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sync engine holds two handles (local cache, remote store) and
//! reaches the right repository for an entity type through [`Stored`].

use async_trait::async_trait;
use emporium_core::{Category, Customer, Entity, EntityKind, Product, Sale, SaleItem};
use std::fmt;
use std::sync::Arc;

use crate::error::DbResult;
use crate::repository::{Repository, StockRepository, UserRepository};

/// Which implementation backs a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Null,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Sqlite => f.write_str("sqlite"),
            StoreKind::Null => f.write_str("null"),
        }
    }
}

/// A complete set of repositories.
#[async_trait]
pub trait Store: Send + Sync {
    fn kind(&self) -> StoreKind;

    fn customers(&self) -> &dyn Repository<Customer>;
    fn categories(&self) -> &dyn Repository<Category>;
    fn products(&self) -> &dyn Repository<Product>;
    fn sales(&self) -> &dyn Repository<Sale>;
    fn sale_items(&self) -> &dyn Repository<SaleItem>;
    fn stock(&self) -> &dyn StockRepository;
    fn users(&self) -> &dyn UserRepository;

    /// `true` if the store answers a trivial query.
    async fn health_check(&self) -> bool;

    /// Releases connections. Later calls fail.
    async fn close(&self) {}

    /// Whether a record of `kind` with `id` exists.
    async fn exists(&self, kind: EntityKind, id: &str) -> DbResult<bool> {
        match kind {
            EntityKind::Category => self.categories().exists(id).await,
            EntityKind::Customer => self.customers().exists(id).await,
            EntityKind::Product => self.products().exists(id).await,
            EntityKind::Sale => self.sales().exists(id).await,
            EntityKind::SaleItem => self.sale_items().exists(id).await,
        }
    }
}

/// Shared handle to a store.
pub type StoreHandle = Arc<dyn Store>;

/// Maps an entity type to its repository on any store.
pub trait Stored: Entity {
    fn repository(store: &dyn Store) -> &dyn Repository<Self>;
}

impl Stored for Customer {
    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.customers()
    }
}

impl Stored for Category {
    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.categories()
    }
}

impl Stored for Product {
    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.products()
    }
}

impl Stored for Sale {
    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.sales()
    }
}

impl Stored for SaleItem {
    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.sale_items()
    }
}

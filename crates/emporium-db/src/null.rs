//! # Null Store
//!
//! Stand-in used when the real store cannot be opened at startup.
//! Reads succeed with nothing in them; writes fail with
//! [`DbError::Unavailable`] so the caller can tell the user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emporium_core::{Category, Customer, Entity, Product, Sale, SaleItem, StockEntry, User};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{Repository, StockChange, StockRepository, UserRepository};
use crate::store::{Store, StoreKind};

/// Repository for every table of the null store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRepository;

#[async_trait]
impl<E: Entity> Repository<E> for NullRepository {
    async fn fetch(&self, _id: &str) -> DbResult<Option<E>> {
        Ok(None)
    }

    async fn fetch_all(&self) -> DbResult<Vec<E>> {
        Ok(Vec::new())
    }

    async fn insert(&self, entity: &E) -> DbResult<()> {
        debug!(kind = %E::KIND, id = %entity.id(), "Write refused: store unavailable");
        Err(DbError::Unavailable)
    }

    async fn replace(&self, _entity: &E, _expected_revision: i64) -> DbResult<bool> {
        Err(DbError::Unavailable)
    }

    async fn upsert(&self, _entity: &E) -> DbResult<()> {
        Err(DbError::Unavailable)
    }

    async fn remove(&self, _id: &str) -> DbResult<bool> {
        Err(DbError::Unavailable)
    }

    async fn count_references(&self, _id: &str) -> DbResult<u64> {
        Ok(0)
    }

    async fn count(&self) -> DbResult<u64> {
        Ok(0)
    }
}

#[async_trait]
impl StockRepository for NullRepository {
    async fn apply_delta(
        &self,
        _product_id: &str,
        _delta: i64,
        _now: DateTime<Utc>,
    ) -> DbResult<StockChange> {
        Err(DbError::Unavailable)
    }

    async fn set_quantity(
        &self,
        _product_id: &str,
        _quantity: i64,
        _now: DateTime<Utc>,
    ) -> DbResult<i64> {
        Err(DbError::Unavailable)
    }

    async fn quantity(&self, _product_id: &str) -> DbResult<Option<i64>> {
        Ok(None)
    }

    async fn report(&self) -> DbResult<Vec<StockEntry>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl UserRepository for NullRepository {
    async fn find_by_username(&self, _username: &str) -> DbResult<Option<User>> {
        Ok(None)
    }

    async fn insert(&self, _user: &User) -> DbResult<()> {
        Err(DbError::Unavailable)
    }

    async fn count(&self) -> DbResult<u64> {
        Ok(0)
    }
}

/// A store with no data behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore {
    repo: NullRepository,
}

impl NullStore {
    pub fn new() -> Self {
        NullStore::default()
    }
}

#[async_trait]
impl Store for NullStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Null
    }

    fn customers(&self) -> &dyn Repository<Customer> {
        &self.repo
    }

    fn categories(&self) -> &dyn Repository<Category> {
        &self.repo
    }

    fn products(&self) -> &dyn Repository<Product> {
        &self.repo
    }

    fn sales(&self) -> &dyn Repository<Sale> {
        &self.repo
    }

    fn sale_items(&self) -> &dyn Repository<SaleItem> {
        &self.repo
    }

    fn stock(&self) -> &dyn StockRepository {
        &self.repo
    }

    fn users(&self) -> &dyn UserRepository {
        &self.repo
    }

    async fn health_check(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emporium_core::{CategoryDraft, ErrorKind};

    #[tokio::test]
    async fn test_reads_are_empty() {
        let store = NullStore::new();
        assert!(store.products().fetch_all().await.unwrap().is_empty());
        assert!(store.customers().fetch("x").await.unwrap().is_none());
        assert_eq!(store.sales().count().await.unwrap(), 0);
        assert!(store.stock().report().await.unwrap().is_empty());
        assert!(!store.health_check().await);
    }

    #[tokio::test]
    async fn test_writes_are_unavailable() {
        let store = NullStore::new();
        let category = Category::from_draft(
            "c".into(),
            CategoryDraft {
                name: "Bebidas".into(),
                ..Default::default()
            },
            emporium_core::now(),
        )
        .unwrap();

        let err = store.categories().insert(&category).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert!(store.categories().remove("c").await.is_err());
        assert!(store
            .stock()
            .apply_delta("p", 1, emporium_core::now())
            .await
            .is_err());
    }
}

//! # Entity Store
//!
//! The CRUD facade the panel commands call. One generic [`Collection`] per
//! entity type, all sharing the rules below.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  entities.products().update(id, &patch)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bounded(op_timeout) ──────────────────────────► DbError::Timeout       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fetch ──► apply_patch (validate) ──► check links ──► touch             │
//! │       ▲                                                  │              │
//! │       │                                                  ▼              │
//! │       └──── revision moved (≤ 3 attempts) ◄──── replace(expected_rev)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - `create` assigns a fresh UUID, revision 1 and timestamps. It is not
//!   idempotent.
//! - `update` never zeroes fields the patch leaves out; returns `false` if
//!   nothing changed.
//! - `delete` of a referenced record is a conflict; of a missing one, `false`.

use emporium_core::{Category, Customer, Entity, Product, Sale, SaleItem, ValidationError};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::Repository;
use crate::store::{Store, StoreHandle, Stored};

/// Default bound on a single store operation.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// Revision-checked writes give up after this many lost races.
const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// Runs `fut`, failing with [`DbError::Timeout`] once `limit` elapses.
pub async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, limit_ms = limit.as_millis() as u64, "Store operation timed out");
            Err(DbError::timeout(operation, limit.as_secs()))
        }
    }
}

// =============================================================================
// Entity Store
// =============================================================================

/// Typed access to every collection of one store.
///
/// ## Usage
/// ```rust,ignore
/// let entities = EntityStore::new(store).with_timeout(Duration::from_secs(5));
///
/// let id = entities.categories().create(CategoryDraft { name: "Bebidas".into(), ..Default::default() }).await?;
/// let all = entities.categories().get_all(&CategoryFilter::default()).await?;
/// ```
#[derive(Clone)]
pub struct EntityStore {
    store: StoreHandle,
    op_timeout: Duration,
}

impl EntityStore {
    pub fn new(store: StoreHandle) -> Self {
        EntityStore {
            store,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// The collection for any stored entity type.
    pub fn collection<E: Stored>(&self) -> Collection<'_, E> {
        Collection {
            store: self.store.as_ref(),
            op_timeout: self.op_timeout,
            _entity: PhantomData,
        }
    }

    pub fn customers(&self) -> Collection<'_, Customer> {
        self.collection()
    }

    pub fn categories(&self) -> Collection<'_, Category> {
        self.collection()
    }

    pub fn products(&self) -> Collection<'_, Product> {
        self.collection()
    }

    pub fn sales(&self) -> Collection<'_, Sale> {
        self.collection()
    }

    pub fn sale_items(&self) -> Collection<'_, SaleItem> {
        self.collection()
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("store", &self.store.kind())
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}

// =============================================================================
// Collection
// =============================================================================

/// CRUD over one entity type.
pub struct Collection<'a, E: Stored> {
    store: &'a dyn Store,
    op_timeout: Duration,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Stored> Collection<'a, E> {
    fn repo(&self) -> &'a dyn Repository<E> {
        E::repository(self.store)
    }

    fn operation(&self, verb: &str) -> String {
        format!("{} {}", verb, E::KIND)
    }

    /// Validates the draft, checks references and inserts a new record.
    ///
    /// ## Returns
    /// * `Ok(id)` - The store-assigned identifier
    /// * `Err(DbError::Validation)` - Malformed draft or unknown reference
    pub async fn create(&self, draft: E::Draft) -> DbResult<String> {
        let entity = E::from_draft(emporium_core::new_id(), draft, emporium_core::now())?;

        bounded(&self.operation("create"), self.op_timeout, async {
            self.check_links(&entity).await?;
            self.repo().insert(&entity).await
        })
        .await?;

        info!(kind = %E::KIND, id = %entity.id(), "Created");
        Ok(entity.id().to_string())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<E> {
        bounded(&self.operation("get"), self.op_timeout, self.repo().fetch(id))
            .await?
            .ok_or_else(|| DbError::not_found(E::KIND.label(), id))
    }

    /// Every record matching `filter`, in the repository's order.
    pub async fn get_all(&self, filter: &E::Filter) -> DbResult<Vec<E>> {
        let all = bounded(&self.operation("list"), self.op_timeout, self.repo().fetch_all()).await?;
        Ok(all.into_iter().filter(|e| e.matches(filter)).collect())
    }

    /// Applies a partial update.
    ///
    /// ## Returns
    /// * `Ok(true)` - The record changed; revision bumped
    /// * `Ok(false)` - The patch changed nothing; nothing written
    /// * `Err(DbError::NotFound)` - No such record
    /// * `Err(DbError::ConcurrentModification)` - Lost the race every attempt
    pub async fn update(&self, id: &str, patch: &E::Patch) -> DbResult<bool> {
        let changed = bounded(&self.operation("update"), self.op_timeout, async {
            for attempt in 1..=MAX_UPDATE_ATTEMPTS {
                let Some(mut entity) = self.repo().fetch(id).await? else {
                    return Err(DbError::not_found(E::KIND.label(), id));
                };
                let expected = entity.revision();

                if !entity.apply_patch(patch)? {
                    return Ok(false);
                }
                self.check_links(&entity).await?;
                entity.touch(emporium_core::now());

                if self.repo().replace(&entity, expected).await? {
                    return Ok(true);
                }
                debug!(kind = %E::KIND, id, attempt, "Revision moved, retrying update");
            }

            Err(DbError::ConcurrentModification {
                entity: E::KIND.label().to_string(),
                id: id.to_string(),
            })
        })
        .await?;

        if changed {
            info!(kind = %E::KIND, id, "Updated");
        }
        Ok(changed)
    }

    /// Deletes a record unless another references it. Sales take their
    /// items with them.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let deleted = bounded(&self.operation("delete"), self.op_timeout, self.repo().remove(id)).await?;
        if deleted {
            info!(kind = %E::KIND, id, "Deleted");
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> DbResult<u64> {
        bounded(&self.operation("count"), self.op_timeout, self.repo().count()).await
    }

    async fn check_links(&self, entity: &E) -> DbResult<()> {
        for link in entity.links() {
            if !self.store.exists(link.kind, link.id).await? {
                return Err(ValidationError::unknown_reference(link.field, link.id).into());
            }
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, NullStore};
    use emporium_core::*;
    use std::sync::Arc;

    async fn entities() -> EntityStore {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        EntityStore::new(Arc::new(db))
    }

    fn product_draft(name: &str, quantity: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: Some("Torrado e moído".to_string()),
            price_cents: 1890,
            quantity,
            barcode: Some("7891000100103".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let entities = entities().await;
        let draft = product_draft("Café 500g", 10);

        let id = entities.products().create(draft.clone()).await.unwrap();
        let product = entities.products().get_by_id(&id).await.unwrap();

        assert_eq!(product.id, id);
        assert_eq!(product.name, draft.name);
        assert_eq!(product.description, draft.description);
        assert_eq!(product.price_cents, draft.price_cents);
        assert_eq!(product.quantity, draft.quantity);
        assert_eq!(product.barcode, draft.barcode);
        assert_eq!(product.revision, 1);
    }

    #[tokio::test]
    async fn test_create_is_not_idempotent() {
        let entities = entities().await;
        let a = entities.products().create(product_draft("Açúcar", 1)).await.unwrap();
        let b = entities.products().create(product_draft("Açúcar", 1)).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(entities.products().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft() {
        let entities = entities().await;
        let err = entities
            .products()
            .create(ProductDraft {
                name: "  ".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(entities.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let entities = entities().await;
        let err = entities.customers().get_by_id("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_get_all_is_idempotent_and_filters() {
        let entities = entities().await;
        entities.products().create(product_draft("Café", 3)).await.unwrap();
        entities.products().create(product_draft("Chá", 0)).await.unwrap();

        let first = entities.products().get_all(&ProductFilter::default()).await.unwrap();
        let second = entities.products().get_all(&ProductFilter::default()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);

        let in_stock = entities
            .products()
            .get_all(&ProductFilter {
                in_stock: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_stock.len(), 1);
        assert_eq!(in_stock[0].name, "Café");
    }

    #[tokio::test]
    async fn test_update_name_leaves_other_fields() {
        let entities = entities().await;
        let id = entities.products().create(product_draft("Café", 7)).await.unwrap();
        let before = entities.products().get_by_id(&id).await.unwrap();

        let patch = ProductPatch {
            name: Some("Café Especial".into()),
            ..Default::default()
        };
        assert!(entities.products().update(&id, &patch).await.unwrap());

        let after = entities.products().get_by_id(&id).await.unwrap();
        assert_eq!(after.name, "Café Especial");
        assert_eq!(after.price_cents, before.price_cents);
        assert_eq!(after.quantity, before.quantity);
        assert_eq!(after.description, before.description);
        assert_eq!(after.barcode, before.barcode);
        assert_eq!(after.revision, before.revision + 1);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_update_without_changes_returns_false() {
        let entities = entities().await;
        let id = entities.products().create(product_draft("Café", 7)).await.unwrap();

        assert!(!entities.products().update(&id, &ProductPatch::default()).await.unwrap());
        let same = ProductPatch {
            name: Some("Café".into()),
            ..Default::default()
        };
        assert!(!entities.products().update(&id, &same).await.unwrap());
        assert_eq!(entities.products().get_by_id(&id).await.unwrap().revision, 1);
    }

    #[tokio::test]
    async fn test_update_clears_optional_field() {
        let entities = entities().await;
        let id = entities.products().create(product_draft("Café", 7)).await.unwrap();

        let patch = ProductPatch {
            barcode: Some(None),
            ..Default::default()
        };
        assert!(entities.products().update(&id, &patch).await.unwrap());
        assert!(entities.products().get_by_id(&id).await.unwrap().barcode.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let entities = entities().await;
        let patch = CategoryPatch {
            name: Some("Bebidas".into()),
            ..Default::default()
        };
        let err = entities.categories().update("missing", &patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_updates_are_not_lost() {
        let entities = entities().await;
        let id = entities.products().create(product_draft("Café", 7)).await.unwrap();

        let (a, b) = (entities.clone(), entities.clone());
        let (id_a, id_b) = (id.clone(), id.clone());
        let rename = tokio::spawn(async move {
            let patch = ProductPatch {
                name: Some("Café Forte".into()),
                ..Default::default()
            };
            a.products().update(&id_a, &patch).await
        });
        let reprice = tokio::spawn(async move {
            let patch = ProductPatch {
                price_cents: Some(2190),
                ..Default::default()
            };
            b.products().update(&id_b, &patch).await
        });

        assert!(rename.await.unwrap().unwrap());
        assert!(reprice.await.unwrap().unwrap());

        let product = entities.products().get_by_id(&id).await.unwrap();
        assert_eq!(product.name, "Café Forte");
        assert_eq!(product.price_cents, 2190);
        assert_eq!(product.revision, 3);
    }

    #[tokio::test]
    async fn test_delete_referenced_category_conflicts() {
        let entities = entities().await;
        let category_id = entities
            .categories()
            .create(CategoryDraft {
                name: "Mercearia".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let product_id = entities
            .products()
            .create(ProductDraft {
                category_id: Some(category_id.clone()),
                ..product_draft("Arroz", 4)
            })
            .await
            .unwrap();

        let err = entities.categories().delete(&category_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(entities.categories().get_by_id(&category_id).await.is_ok());
        assert!(entities.products().get_by_id(&product_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let entities = entities().await;
        assert!(!entities.customers().delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_sale_requires_known_customer() {
        let entities = entities().await;
        let err = entities
            .sales()
            .create(SaleDraft {
                customer_id: new_id(),
                total_cents: 1000,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_delete_sale_cascades_items() {
        let entities = entities().await;
        let customer_id = entities
            .customers()
            .create(CustomerDraft {
                name: "Maria Silva".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let product_id = entities.products().create(product_draft("Café", 5)).await.unwrap();
        let sale_id = entities
            .sales()
            .create(SaleDraft {
                customer_id: customer_id.clone(),
                total_cents: 3780,
                ..Default::default()
            })
            .await
            .unwrap();
        entities
            .sale_items()
            .create(SaleItemDraft {
                sale_id: sale_id.clone(),
                product_id: product_id.clone(),
                quantity: 2,
                unit_price_cents: 1890,
            })
            .await
            .unwrap();

        // The customer now has a sale and cannot go away
        let err = entities.customers().delete(&customer_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert!(entities.sales().delete(&sale_id).await.unwrap());
        assert_eq!(entities.sale_items().count().await.unwrap(), 0);
        assert!(entities.customers().delete(&customer_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_null_store_reads_empty_writes_unavailable() {
        let entities = EntityStore::new(Arc::new(NullStore::new()));

        assert!(entities
            .customers()
            .get_all(&CustomerFilter::default())
            .await
            .unwrap()
            .is_empty());
        let err = entities
            .categories()
            .create(CategoryDraft {
                name: "Bebidas".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let err = bounded("slow op", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
    }
}

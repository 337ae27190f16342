//! # Stock Ledger
//!
//! Quantity changes for products. Every mutation is a single conditional
//! UPDATE, so concurrent adjustments never drive stock below zero.
//!
//! ```text
//! adjust_quantity(id, -3)   quantity 2 → InsufficientStock, stays 2
//! adjust_quantity(id, -2)   quantity 2 → 0, in_stock = false
//! set_quantity(id, -1)      → ValidationError, unchanged
//! ```

use emporium_core::validation::validate_stock_quantity;
use emporium_core::{StockEntry, StockStatus, ValidationError};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use crate::entities::{bounded, DEFAULT_OP_TIMEOUT};
use crate::error::{DbError, DbResult};
use crate::repository::StockChange;
use crate::store::StoreHandle;

#[derive(Clone)]
pub struct StockLedger {
    store: StoreHandle,
    op_timeout: Duration,
}

impl StockLedger {
    pub fn new(store: StoreHandle) -> Self {
        StockLedger {
            store,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    /// Adds `delta` (negative to remove) and returns the new quantity.
    ///
    /// ## Errors
    /// * `DbError::InsufficientStock` - The result would be negative;
    ///   quantity unchanged
    /// * `DbError::Validation` - The result would not fit in an `i64`;
    ///   quantity unchanged
    /// * `DbError::NotFound` - No such product
    pub async fn adjust_quantity(&self, product_id: &str, delta: i64) -> DbResult<i64> {
        let change = bounded("adjust stock", self.op_timeout, async {
            self.store
                .stock()
                .apply_delta(product_id, delta, emporium_core::now())
                .await
        })
        .await?;

        match change {
            StockChange::Applied(quantity) => {
                info!(id = %product_id, delta, quantity, "Stock adjusted");
                Ok(quantity)
            }
            StockChange::Rejected { current } => {
                warn!(id = %product_id, delta, current, "Stock adjustment refused");
                if current.checked_add(delta).is_none() {
                    return Err(ValidationError::invalid(
                        "quantity",
                        "adjustment exceeds the largest storable quantity",
                    )
                    .into());
                }
                Err(DbError::InsufficientStock {
                    product_id: product_id.to_string(),
                    available: current,
                    requested: delta.saturating_neg(),
                })
            }
        }
    }

    /// Sets an absolute quantity. Negative values are rejected before any
    /// write.
    pub async fn set_quantity(&self, product_id: &str, quantity: i64) -> DbResult<i64> {
        validate_stock_quantity(quantity)?;

        let quantity = bounded("set stock", self.op_timeout, async {
            self.store
                .stock()
                .set_quantity(product_id, quantity, emporium_core::now())
                .await
        })
        .await?;

        info!(id = %product_id, quantity, "Stock set");
        Ok(quantity)
    }

    pub async fn status(&self, product_id: &str) -> DbResult<StockStatus> {
        let quantity =
            bounded("stock status", self.op_timeout, self.store.stock().quantity(product_id)).await?;

        quantity
            .map(StockStatus::from_quantity)
            .ok_or_else(|| DbError::not_found("Product", product_id))
    }

    /// Every product with its category name ("Uncategorized" when the
    /// category is unset or gone).
    pub async fn report(&self) -> DbResult<Vec<StockEntry>> {
        bounded("stock report", self.op_timeout, self.store.stock().report()).await
    }
}

impl fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StockLedger")
            .field("store", &self.store.kind())
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, EntityStore, NullStore};
    use emporium_core::{CategoryDraft, ErrorKind, ProductDraft, UNCATEGORIZED};
    use std::sync::Arc;

    async fn setup(quantity: i64) -> (EntityStore, StockLedger, String) {
        let store: StoreHandle = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let entities = EntityStore::new(store.clone());
        let id = entities
            .products()
            .create(ProductDraft {
                name: "Feijão 1kg".into(),
                price_cents: 899,
                quantity,
                ..Default::default()
            })
            .await
            .unwrap();
        (entities, StockLedger::new(store), id)
    }

    #[tokio::test]
    async fn test_adjust_to_zero_then_refuse() {
        let (_, ledger, id) = setup(5).await;

        assert_eq!(ledger.adjust_quantity(&id, -5).await.unwrap(), 0);
        let status = ledger.status(&id).await.unwrap();
        assert!(!status.in_stock);
        assert_eq!(status.quantity, 0);

        let err = ledger.adjust_quantity(&id, -1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(
            err,
            DbError::InsufficientStock {
                available: 0,
                requested: 1,
                ..
            }
        ));
        assert_eq!(ledger.status(&id).await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_adjust_at_integer_bounds() {
        let (entities, ledger, id) = setup(5).await;

        let err = ledger.adjust_quantity(&id, i64::MAX).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ledger.adjust_quantity(&id, i64::MIN).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock {
                available: 5,
                requested: i64::MAX,
                ..
            }
        ));

        // Neither refusal touched the row, which still reads back cleanly
        assert_eq!(ledger.status(&id).await.unwrap().quantity, 5);
        let product = entities.products().get_by_id(&id).await.unwrap();
        assert_eq!(product.quantity, 5);
        assert_eq!(product.revision, 1);
        assert_eq!(ledger.report().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_negative_is_rejected() {
        let (_, ledger, id) = setup(4).await;

        let err = ledger.set_quantity(&id, -1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ledger.status(&id).await.unwrap().quantity, 4);

        assert_eq!(ledger.set_quantity(&id, 12).await.unwrap(), 12);
        assert!(ledger.status(&id).await.unwrap().in_stock);
    }

    #[tokio::test]
    async fn test_mutations_bump_revision() {
        let (entities, ledger, id) = setup(1).await;

        ledger.adjust_quantity(&id, 3).await.unwrap();
        ledger.set_quantity(&id, 9).await.unwrap();

        let product = entities.products().get_by_id(&id).await.unwrap();
        assert_eq!(product.quantity, 9);
        assert_eq!(product.revision, 3);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let (_, ledger, _) = setup(1).await;

        assert_eq!(
            ledger.status("missing").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ledger.adjust_quantity("missing", 1).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ledger.set_quantity("missing", 1).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_decrements_never_oversell() {
        let (_, ledger, id) = setup(10).await;

        let mut handles = Vec::new();
        for _ in 0..15 {
            let ledger = ledger.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move { ledger.adjust_quantity(&id, -1).await }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                applied += 1;
            }
        }

        assert_eq!(applied, 10);
        assert_eq!(ledger.status(&id).await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_report_resolves_category_names() {
        let (entities, ledger, _) = setup(2).await;
        let category_id = entities
            .categories()
            .create(CategoryDraft {
                name: "Bebidas".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        entities
            .products()
            .create(ProductDraft {
                name: "Água 500ml".into(),
                price_cents: 250,
                quantity: 0,
                category_id: Some(category_id),
                ..Default::default()
            })
            .await
            .unwrap();

        let report = ledger.report().await.unwrap();
        assert_eq!(report.len(), 2);

        let water = report.iter().find(|e| e.name == "Água 500ml").unwrap();
        assert_eq!(water.category_name, "Bebidas");
        assert!(!water.in_stock());

        let beans = report.iter().find(|e| e.name == "Feijão 1kg").unwrap();
        assert_eq!(beans.category_name, UNCATEGORIZED);
        assert!(beans.in_stock());
    }

    #[tokio::test]
    async fn test_null_store_ledger() {
        let ledger = StockLedger::new(Arc::new(NullStore::new()));

        assert!(ledger.report().await.unwrap().is_empty());
        assert_eq!(
            ledger.adjust_quantity("p", 1).await.unwrap_err().kind(),
            ErrorKind::Connectivity
        );
    }
}

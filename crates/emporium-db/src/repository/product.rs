//! # Product Repository
//!
//! Database operations for products, including the atomic quantity updates
//! behind the stock ledger.
//!
//! ## Conditional Stock Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, check, write (two requests can both pass the check)│
//! │     SELECT quantity ... ; if q + delta >= 0 { UPDATE ... SET q = ? }│
//! │                                                                     │
//! │  ✅ CORRECT: one conditional statement                              │
//! │     UPDATE products SET quantity = quantity + ?2                    │
//! │     WHERE id = ?1 AND quantity + ?2 >= 0                            │
//! │     RETURNING quantity                                              │
//! │                                                                     │
//! │  No row back → product missing, or the delta would go negative.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{guarded_delete_outcome, Repository, SqliteQuery, StockChange, StockRepository};
use crate::error::{DbError, DbResult};
use emporium_core::{Product, StockEntry, UNCATEGORIZED};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.fetch("uuid-here").await?;
/// let change = repo.apply_delta("uuid-here", -2, emporium_core::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }
}

fn bind_product<'q>(query: SqliteQuery<'q>, p: &'q Product) -> SqliteQuery<'q> {
    query
        .bind(&p.id)
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.price_cents)
        .bind(p.quantity)
        .bind(&p.category_id)
        .bind(&p.barcode)
        .bind(&p.image)
        .bind(p.revision)
        .bind(p.created_at)
        .bind(p.updated_at)
}

#[async_trait]
impl Repository<Product> for ProductRepository {
    async fn fetch(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, quantity, category_id, barcode, image,
                   revision, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn fetch_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, quantity, category_id, barcode, image,
                   revision, created_at, updated_at
            FROM products
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let query = sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, quantity, category_id, barcode, image,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        );
        bind_product(query, product).execute(&self.pool).await?;

        Ok(())
    }

    async fn replace(&self, product: &Product, expected_revision: i64) -> DbResult<bool> {
        debug!(id = %product.id, expected_revision, "Replacing product");

        let query = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2, description = ?3, price_cents = ?4, quantity = ?5,
                category_id = ?6, barcode = ?7, image = ?8,
                revision = ?9, created_at = ?10, updated_at = ?11
            WHERE id = ?1 AND revision = ?12
            "#,
        );
        let result = bind_product(query, product)
            .bind(expected_revision)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, product: &Product) -> DbResult<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, quantity, category_id, barcode, image,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                price_cents = excluded.price_cents,
                quantity = excluded.quantity,
                category_id = excluded.category_id,
                barcode = excluded.barcode,
                image = excluded.image,
                revision = excluded.revision,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        );
        bind_product(query, product).execute(&self.pool).await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query(
            r#"
            DELETE FROM products
            WHERE id = ?1
              AND NOT EXISTS (SELECT 1 FROM sale_items WHERE product_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        guarded_delete_outcome::<Product, _>(self, id, result.rows_affected()).await
    }

    async fn count_references(&self, id: &str) -> DbResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    /// Counts total products (dashboard).
    async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

#[async_trait]
impl StockRepository for ProductRepository {
    /// Applies a stock delta (negative for sales, positive for restocking).
    ///
    /// Bumps `revision` so the sync engine treats the new quantity as the
    /// newer write. SQLite turns an overflowing sum into a REAL, so the
    /// guard also requires the result to stay an integer.
    async fn apply_delta(
        &self,
        product_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<StockChange> {
        debug!(id = %product_id, delta, "Adjusting stock");

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET
                quantity = quantity + ?2,
                revision = revision + 1,
                updated_at = ?3
            WHERE id = ?1
              AND quantity + ?2 >= 0
              AND typeof(quantity + ?2) = 'integer'
            RETURNING quantity
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(quantity) = updated {
            return Ok(StockChange::Applied(quantity));
        }

        match self.quantity(product_id).await? {
            Some(current) => Ok(StockChange::Rejected { current }),
            None => Err(DbError::not_found("Product", product_id)),
        }
    }

    async fn set_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        debug!(id = %product_id, quantity, "Setting stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                quantity = ?2,
                revision = revision + 1,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(quantity)
    }

    async fn quantity(&self, product_id: &str) -> DbResult<Option<i64>> {
        let quantity = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quantity)
    }

    async fn report(&self) -> DbResult<Vec<StockEntry>> {
        let entries = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT
                p.id,
                p.name,
                p.description,
                p.quantity,
                p.price_cents,
                COALESCE(c.name, ?1) AS category_name,
                p.image,
                p.barcode
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.name, p.id
            "#,
        )
        .bind(UNCATEGORIZED)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use emporium_core::{Entity, ProductDraft};

    async fn repo_with(quantity: i64) -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = Product::from_draft(
            emporium_core::new_id(),
            ProductDraft {
                name: "Arroz 5kg".into(),
                price_cents: 2590,
                quantity,
                ..Default::default()
            },
            emporium_core::now(),
        )
        .unwrap();
        db.product_repository().insert(&product).await.unwrap();
        (db, product)
    }

    #[tokio::test]
    async fn test_apply_delta_is_conditional() {
        let (db, product) = repo_with(3).await;
        let repo = db.product_repository();
        let now = emporium_core::now();

        assert_eq!(
            repo.apply_delta(&product.id, -3, now).await.unwrap(),
            StockChange::Applied(0)
        );
        assert_eq!(
            repo.apply_delta(&product.id, -1, now).await.unwrap(),
            StockChange::Rejected { current: 0 }
        );
        assert_eq!(repo.quantity(&product.id).await.unwrap(), Some(0));

        let stored = repo.fetch(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.revision, 2, "only the applied delta bumps the revision");
    }

    #[tokio::test]
    async fn test_apply_delta_refuses_overflow() {
        let (db, product) = repo_with(5).await;
        let repo = db.product_repository();
        let now = emporium_core::now();

        assert_eq!(
            repo.apply_delta(&product.id, i64::MAX, now).await.unwrap(),
            StockChange::Rejected { current: 5 }
        );
        assert_eq!(
            repo.apply_delta(&product.id, i64::MIN, now).await.unwrap(),
            StockChange::Rejected { current: 5 }
        );

        // The row is untouched and still decodes
        let stored = repo.fetch(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 5);
        assert_eq!(stored.revision, 1);

        assert_eq!(
            repo.apply_delta(&product.id, i64::MAX - 5, now).await.unwrap(),
            StockChange::Applied(i64::MAX)
        );
    }

    #[tokio::test]
    async fn test_apply_delta_missing_product() {
        let (db, _) = repo_with(1).await;
        let err = db
            .product_repository()
            .apply_delta("missing", 1, emporium_core::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_check_constraint_rejects_negative_quantity() {
        let (db, product) = repo_with(1).await;
        let err = db
            .product_repository()
            .set_quantity(&product.id, -5, emporium_core::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_report_marks_dangling_category_uncategorized() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = Product::from_draft(
            emporium_core::new_id(),
            ProductDraft {
                name: "Feijão".into(),
                price_cents: 899,
                quantity: 0,
                category_id: Some("gone".into()),
                ..Default::default()
            },
            emporium_core::now(),
        )
        .unwrap();
        db.product_repository().insert(&product).await.unwrap();

        let report = db.product_repository().report().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].category_name, UNCATEGORIZED);
        assert!(!report[0].in_stock());
    }

    #[tokio::test]
    async fn test_replace_checks_revision() {
        let (db, product) = repo_with(1).await;
        let repo = db.product_repository();

        let mut next = product.clone();
        next.name = "Arroz 1kg".into();
        next.touch(emporium_core::now());

        assert!(!repo.replace(&next, 7).await.unwrap());
        assert!(repo.replace(&next, product.revision).await.unwrap());
        assert!(!repo.replace(&next, product.revision).await.unwrap());
    }
}

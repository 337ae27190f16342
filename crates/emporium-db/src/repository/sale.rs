//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sales ◄──────── sale_items.sale_id  (FOREIGN KEY ... ON DELETE CASCADE)│
//! │                                                                         │
//! │  DELETE FROM sales WHERE id = ?   →  its sale_items go with it          │
//! │                                                                         │
//! │  Upserts use ON CONFLICT(id) DO UPDATE so that syncing a sale never     │
//! │  deletes-and-reinserts the row (which would fire the cascade).          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::{Repository, SqliteQuery};
use crate::error::DbResult;
use emporium_core::{Sale, SaleItem};

// =============================================================================
// Sales
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }
}

fn bind_sale<'q>(query: SqliteQuery<'q>, s: &'q Sale) -> SqliteQuery<'q> {
    query
        .bind(&s.id)
        .bind(&s.customer_id)
        .bind(s.sold_at)
        .bind(s.total_cents)
        .bind(s.status)
        .bind(&s.notes)
        .bind(s.revision)
        .bind(s.created_at)
        .bind(s.updated_at)
}

#[async_trait]
impl Repository<Sale> for SaleRepository {
    async fn fetch(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_id, sold_at, total_cents, status, notes,
                   revision, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Most recent first, as the sales screen lists them.
    async fn fetch_all(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_id, sold_at, total_cents, status, notes,
                   revision, created_at, updated_at
            FROM sales
            ORDER BY sold_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, customer_id = %sale.customer_id, "Inserting sale");

        let query = sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, sold_at, total_cents, status, notes,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        );
        bind_sale(query, sale).execute(&self.pool).await?;

        Ok(())
    }

    async fn replace(&self, sale: &Sale, expected_revision: i64) -> DbResult<bool> {
        debug!(id = %sale.id, expected_revision, "Replacing sale");

        let query = sqlx::query(
            r#"
            UPDATE sales SET
                customer_id = ?2, sold_at = ?3, total_cents = ?4, status = ?5, notes = ?6,
                revision = ?7, created_at = ?8, updated_at = ?9
            WHERE id = ?1 AND revision = ?10
            "#,
        );
        let result = bind_sale(query, sale)
            .bind(expected_revision)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, sale: &Sale) -> DbResult<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, sold_at, total_cents, status, notes,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                customer_id = excluded.customer_id,
                sold_at = excluded.sold_at,
                total_cents = excluded.total_cents,
                status = excluded.status,
                notes = excluded.notes,
                revision = excluded.revision,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        );
        bind_sale(query, sale).execute(&self.pool).await?;

        Ok(())
    }

    /// Deletes the sale and, through the cascade, its items.
    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Items are owned, not references: they never block a delete.
    async fn count_references(&self, _id: &str) -> DbResult<u64> {
        Ok(0)
    }

    async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

// =============================================================================
// Sale Items
// =============================================================================

/// Repository for sale item database operations.
#[derive(Debug, Clone)]
pub struct SaleItemRepository {
    pool: SqlitePool,
}

impl SaleItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleItemRepository { pool }
    }
}

fn bind_item<'q>(query: SqliteQuery<'q>, i: &'q SaleItem) -> SqliteQuery<'q> {
    query
        .bind(&i.id)
        .bind(&i.sale_id)
        .bind(&i.product_id)
        .bind(i.quantity)
        .bind(i.unit_price_cents)
        .bind(i.revision)
        .bind(i.created_at)
        .bind(i.updated_at)
}

#[async_trait]
impl Repository<SaleItem> for SaleItemRepository {
    async fn fetch(&self, id: &str) -> DbResult<Option<SaleItem>> {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents,
                   revision, created_at, updated_at
            FROM sale_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn fetch_all(&self) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents,
                   revision, created_at, updated_at
            FROM sale_items
            ORDER BY sale_id, created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn insert(&self, item: &SaleItem) -> DbResult<()> {
        debug!(id = %item.id, sale_id = %item.sale_id, "Inserting sale item");

        let query = sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, quantity, unit_price_cents,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        );
        bind_item(query, item).execute(&self.pool).await?;

        Ok(())
    }

    async fn replace(&self, item: &SaleItem, expected_revision: i64) -> DbResult<bool> {
        let query = sqlx::query(
            r#"
            UPDATE sale_items SET
                sale_id = ?2, product_id = ?3, quantity = ?4, unit_price_cents = ?5,
                revision = ?6, created_at = ?7, updated_at = ?8
            WHERE id = ?1 AND revision = ?9
            "#,
        );
        let result = bind_item(query, item)
            .bind(expected_revision)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, item: &SaleItem) -> DbResult<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, quantity, unit_price_cents,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                sale_id = excluded.sale_id,
                product_id = excluded.product_id,
                quantity = excluded.quantity,
                unit_price_cents = excluded.unit_price_cents,
                revision = excluded.revision,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        );
        bind_item(query, item).execute(&self.pool).await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sale_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_references(&self, _id: &str) -> DbResult<u64> {
        Ok(0)
    }

    async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

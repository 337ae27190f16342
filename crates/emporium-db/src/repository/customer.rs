//! # Customer Repository
//!
//! Database operations for customers. A customer with recorded sales
//! cannot be deleted.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::{guarded_delete_outcome, Repository, SqliteQuery};
use crate::error::DbResult;
use emporium_core::Customer;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }
}

/// Binds every column in declaration order (?1 = id ... ?12 = updated_at).
fn bind_customer<'q>(query: SqliteQuery<'q>, c: &'q Customer) -> SqliteQuery<'q> {
    query
        .bind(&c.id)
        .bind(&c.name)
        .bind(&c.email)
        .bind(&c.phone)
        .bind(&c.tax_id)
        .bind(&c.address)
        .bind(&c.city)
        .bind(&c.state)
        .bind(&c.postal_code)
        .bind(c.revision)
        .bind(c.created_at)
        .bind(c.updated_at)
}

#[async_trait]
impl Repository<Customer> for CustomerRepository {
    async fn fetch(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, tax_id, address, city, state, postal_code,
                   revision, created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn fetch_all(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, tax_id, address, city, state, postal_code,
                   revision, created_at, updated_at
            FROM customers
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        let query = sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, email, phone, tax_id, address, city, state, postal_code,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        );
        bind_customer(query, customer).execute(&self.pool).await?;

        Ok(())
    }

    async fn replace(&self, customer: &Customer, expected_revision: i64) -> DbResult<bool> {
        debug!(id = %customer.id, expected_revision, "Replacing customer");

        let query = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2, email = ?3, phone = ?4, tax_id = ?5, address = ?6,
                city = ?7, state = ?8, postal_code = ?9,
                revision = ?10, created_at = ?11, updated_at = ?12
            WHERE id = ?1 AND revision = ?13
            "#,
        );
        let result = bind_customer(query, customer)
            .bind(expected_revision)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, customer: &Customer) -> DbResult<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, email, phone, tax_id, address, city, state, postal_code,
                revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                phone = excluded.phone,
                tax_id = excluded.tax_id,
                address = excluded.address,
                city = excluded.city,
                state = excluded.state,
                postal_code = excluded.postal_code,
                revision = excluded.revision,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        );
        bind_customer(query, customer).execute(&self.pool).await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query(
            r#"
            DELETE FROM customers
            WHERE id = ?1
              AND NOT EXISTS (SELECT 1 FROM sales WHERE customer_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        guarded_delete_outcome::<Customer, _>(self, id, result.rows_affected()).await
    }

    async fn count_references(&self, id: &str) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE customer_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

//! # Category Repository
//!
//! Database operations for categories. A category still assigned to a
//! product cannot be deleted; products pointing at a category that was
//! never pulled are reported as "Uncategorized" instead.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::{guarded_delete_outcome, Repository, SqliteQuery};
use crate::error::DbResult;
use emporium_core::Category;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }
}

fn bind_category<'q>(query: SqliteQuery<'q>, c: &'q Category) -> SqliteQuery<'q> {
    query
        .bind(&c.id)
        .bind(&c.name)
        .bind(&c.description)
        .bind(&c.color)
        .bind(&c.icon)
        .bind(c.revision)
        .bind(c.created_at)
        .bind(c.updated_at)
}

#[async_trait]
impl Repository<Category> for CategoryRepository {
    async fn fetch(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, color, icon, revision, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn fetch_all(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, color, icon, revision, created_at, updated_at
            FROM categories
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn insert(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, name = %category.name, "Inserting category");

        let query = sqlx::query(
            r#"
            INSERT INTO categories (
                id, name, description, color, icon, revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        );
        bind_category(query, category).execute(&self.pool).await?;

        Ok(())
    }

    async fn replace(&self, category: &Category, expected_revision: i64) -> DbResult<bool> {
        debug!(id = %category.id, expected_revision, "Replacing category");

        let query = sqlx::query(
            r#"
            UPDATE categories SET
                name = ?2, description = ?3, color = ?4, icon = ?5,
                revision = ?6, created_at = ?7, updated_at = ?8
            WHERE id = ?1 AND revision = ?9
            "#,
        );
        let result = bind_category(query, category)
            .bind(expected_revision)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, category: &Category) -> DbResult<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO categories (
                id, name, description, color, icon, revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                color = excluded.color,
                icon = excluded.icon,
                revision = excluded.revision,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        );
        bind_category(query, category).execute(&self.pool).await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query(
            r#"
            DELETE FROM categories
            WHERE id = ?1
              AND NOT EXISTS (SELECT 1 FROM products WHERE category_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        guarded_delete_outcome::<Category, _>(self, id, result.rows_affected()).await
    }

    async fn count_references(&self, id: &str) -> DbResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

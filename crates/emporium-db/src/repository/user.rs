//! # User Repository
//!
//! Panel users for the store-backed credential store.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::UserRepository;
use crate::error::DbResult;
use emporium_core::User;

/// SQLite implementation of [`UserRepository`].
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteUserRepository { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        // `=` uses the BINARY collation: case-sensitive
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, email, role, password_hash, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, username = %user.username, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, display_name, email, role, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

//! # Database Error Types
//!
//! Error types for store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error ─────────┐                                                 │
//! │  ValidationError ─────┼──► DbError (this module) ──► kind(): ErrorKind  │
//! │  tokio timeout ───────┘          │                                      │
//! │                                  ├──► SyncError  (sync engine)          │
//! │                                  └──► ApiError   (panel commands)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use emporium_core::{ErrorKind, ValidationError};
use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input rejected before reaching SQL.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Delete refused because other records reference this one.
    ///
    /// ## When This Occurs
    /// - Category still used by a product
    /// - Customer with recorded sales
    /// - Product listed on a sale item
    #[error("{entity} {id} is referenced by {count} other record(s)")]
    Referenced {
        entity: String,
        id: String,
        count: u64,
    },

    /// Stock adjustment would take the quantity below zero.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The record kept changing under a revision-checked update.
    #[error("{entity} {id} was modified concurrently")]
    ConcurrentModification { entity: String, id: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative quantity or price).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// An operation exceeded its time bound.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// No store is configured; the panel runs in degraded mode.
    #[error("Store unavailable")]
    Unavailable,

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        DbError::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Classifies the error into the shared taxonomy.
    ///
    /// ```text
    /// NotFound                                  → NotFound
    /// Validation, ForeignKey, Check             → Validation
    /// Referenced, InsufficientStock,
    /// ConcurrentModification, UniqueViolation   → Conflict
    /// Timeout, PoolExhausted                    → Timeout
    /// Unavailable, ConnectionFailed             → Connectivity
    /// everything else                           → Internal
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::Validation(_)
            | DbError::ForeignKeyViolation { .. }
            | DbError::CheckViolation { .. } => ErrorKind::Validation,
            DbError::Referenced { .. }
            | DbError::InsufficientStock { .. }
            | DbError::ConcurrentModification { .. }
            | DbError::UniqueViolation { .. } => ErrorKind::Conflict,
            DbError::Timeout { .. } | DbError::PoolExhausted => ErrorKind::Timeout,
            DbError::Unavailable | DbError::ConnectionFailed(_) => ErrorKind::Connectivity,
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// sqlx::Error::Io             → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "CHECK constraint failed: <expr>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(DbError::not_found("Product", "p").kind(), ErrorKind::NotFound);
        assert_eq!(
            DbError::from(ValidationError::required("name")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            DbError::InsufficientStock {
                product_id: "p".into(),
                available: 0,
                requested: 1
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(DbError::timeout("get", 10).kind(), ErrorKind::Timeout);
        assert_eq!(DbError::Unavailable.kind(), ErrorKind::Connectivity);
        assert_eq!(DbError::QueryFailed("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_validation_message_is_transparent() {
        let err = DbError::from(ValidationError::required("name"));
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_pool_errors_map() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }
}

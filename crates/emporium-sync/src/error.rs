//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transient     │  │     Persistent          │ │
//! │  │                 │  │  (next tick)    │  │  (surface in status)    │ │
//! │  │  InvalidConfig  │  │  Timeout        │  │  DatabaseError          │ │
//! │  │                 │  │  Connectivity   │  │  ApplyFailed            │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Engine: Internal, PassAbandoned, ShuttingDown                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `SyncError` is `Clone`: one pass outcome is handed to every caller that
//! waited on it.

use emporium_core::ErrorKind;
use emporium_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Transient Errors
    // =========================================================================
    /// A store call exceeded the operation timeout.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// A store could not be reached.
    #[error("Store unreachable: {0}")]
    Connectivity(String),

    // =========================================================================
    // Persistent Errors
    // =========================================================================
    /// Database query failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A record could not be written to the other side.
    #[error("Failed to apply {kind} {id}: {reason}")]
    ApplyFailed {
        kind: String,
        id: String,
        reason: String,
    },

    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// Internal sync engine error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The pass task ended without reporting an outcome.
    #[error("Sync pass ended without an outcome")]
    PassAbandoned,

    /// Engine is shutting down.
    #[error("Sync engine is shutting down")]
    ShuttingDown,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for SyncError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Timeout { operation, secs } => SyncError::Timeout { operation, secs },
            other => match other.kind() {
                ErrorKind::Timeout | ErrorKind::Connectivity => {
                    SyncError::Connectivity(other.to_string())
                }
                _ => SyncError::DatabaseError(other.to_string()),
            },
        }
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the next scheduled pass may succeed where this one
    /// failed.
    ///
    /// ## Retryable Errors
    /// - Timeouts
    /// - Unreachable stores
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Constraint failures while applying records
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Timeout { .. } | SyncError::Connectivity(_))
    }

    /// Classifies the error into the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::InvalidConfig(_) => ErrorKind::Validation,
            SyncError::Timeout { .. } => ErrorKind::Timeout,
            SyncError::Connectivity(_) => ErrorKind::Connectivity,
            SyncError::ApplyFailed { .. } => ErrorKind::Conflict,
            SyncError::DatabaseError(_)
            | SyncError::Internal(_)
            | SyncError::PassAbandoned
            | SyncError::ShuttingDown => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::Timeout {
            operation: "fetch remote product".into(),
            secs: 10
        }
        .is_retryable());
        assert!(SyncError::Connectivity("refused".into()).is_retryable());

        assert!(!SyncError::InvalidConfig("bad interval".into()).is_retryable());
        assert!(!SyncError::DatabaseError("disk I/O error".into()).is_retryable());
        assert!(!SyncError::PassAbandoned.is_retryable());
    }

    #[test]
    fn test_from_db_error() {
        let err: SyncError = DbError::timeout("list product", 10).into();
        assert_eq!(
            err,
            SyncError::Timeout {
                operation: "list product".into(),
                secs: 10
            }
        );

        let err: SyncError = DbError::Unavailable.into();
        assert!(matches!(err, SyncError::Connectivity(_)));

        let err: SyncError = DbError::not_found("Product", "p-1").into();
        assert!(matches!(err, SyncError::DatabaseError(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::ApplyFailed {
            kind: "product".into(),
            id: "abc-123".into(),
            reason: "CHECK constraint failed".into(),
        };
        assert!(err.to_string().contains("product"));
        assert!(err.to_string().contains("abc-123"));
    }
}

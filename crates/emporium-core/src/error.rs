//! # Error Types
//!
//! Domain-specific error types for emporium-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  emporium-core (this file)                                              │
//! │  ├── ValidationError  - Malformed or missing input                      │
//! │  └── ErrorKind        - Shared taxonomy every crate classifies into     │
//! │                                                                         │
//! │  emporium-db          └── DbError     (kind() → ErrorKind)              │
//! │  emporium-sync        └── SyncError   (From<DbError>)                   │
//! │  panel                └── ApiError    (what callers see)                │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → SyncError / ApiError                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Classification shared by all error types in the workspace.
///
/// Each crate keeps its own error enum, but every variant maps onto one of
/// these kinds so boundaries (sync records, API responses) can decide what
/// to do without matching on foreign enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing input. Never retried automatically.
    Validation,
    /// The id has no matching entity.
    NotFound,
    /// Business rule violation (negative stock, referenced deletion).
    Conflict,
    /// An operation exceeded its time bound.
    Timeout,
    /// The store could not be reached.
    Connectivity,
    /// Credential mismatch or invalid token.
    Auth,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Transient kinds are retried by the sync engine on its next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Connectivity)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connectivity => "connectivity",
            ErrorKind::Auth => "auth",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by drafts and patches before anything touches the store, and by
/// the store itself when a record references an entity that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, email, colour, unknown reference).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// A reference to another entity that does not exist.
    pub fn unknown_reference(field: &str, id: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("no record with id {id}"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

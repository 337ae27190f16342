//! # API Error Type
//!
//! Unified error type for panel commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Panel                              │
//! │                                                                         │
//! │  Web layer                   Command layer                              │
//! │  ─────────                   ─────────────                              │
//! │                                                                         │
//! │  POST /produtos/novo                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  DbError / SyncError / AuthError / UploadError                   │  │
//! │  │         │  internal details logged here, once                    │  │
//! │  │         ▼                                                        │  │
//! │  │  ApiError { code, message } ───────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  http_status(): 400 / 401 / 404 / 409 / 503 / 504 / 500                 │
//! │  body():        {"erro": "Produto not found: ..."}                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use emporium_core::{ErrorKind, ValidationError};
use emporium_db::DbError;
use emporium_sync::SyncError;
use serde::Serialize;

use crate::auth::AuthError;
use crate::uploads::UploadError;

/// Result type for command functions.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 9b2f..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Missing or invalid credentials (401)
    Unauthorized,

    /// Resource not found (404)
    NotFound,

    /// Business rule violation (409)
    Conflict,

    /// Store or sync engine unreachable (503)
    Unavailable,

    /// Operation exceeded its time bound (504)
    Timeout,

    /// Internal server error (500)
    Internal,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::Timeout => ErrorCode::Timeout,
            ErrorKind::Connectivity => ErrorCode::Unavailable,
            ErrorKind::Auth => ErrorCode::Unauthorized,
            ErrorKind::Internal => ErrorCode::Internal,
        }
    }
}

/// API-style error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub erro: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// HTTP status the web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self.code {
            ErrorCode::ValidationError => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::Unavailable => 503,
            ErrorCode::Timeout => 504,
            ErrorCode::Internal => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            erro: self.message.clone(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts store errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {}", message);
                ApiError::validation("Invalid value")
            }
            DbError::Timeout { operation, secs } => {
                tracing::warn!(operation = %operation, secs, "Store operation timed out");
                ApiError::new(ErrorCode::Timeout, "Store operation timed out")
            }
            DbError::Unavailable => ApiError::unavailable("Store unavailable"),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::unavailable("Store unavailable")
            }
            DbError::PoolExhausted => {
                tracing::warn!("Database pool exhausted");
                ApiError::new(ErrorCode::Timeout, "Store busy, try again")
            }
            DbError::MigrationFailed(e) | DbError::QueryFailed(e) | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", e);
                ApiError::internal("Database operation failed")
            }
            other => ApiError::new(other.kind().into(), other.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err.kind() {
            ErrorKind::Timeout | ErrorKind::Connectivity | ErrorKind::Validation => {
                ApiError::new(err.kind().into(), err.to_string())
            }
            _ => {
                tracing::error!("Sync failed: {}", err);
                ApiError::internal("Synchronization failed")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                ApiError::new(ErrorCode::Unauthorized, err.to_string())
            }
            AuthError::Backend(e) => {
                tracing::error!("Credential store failed: {}", e);
                ApiError::unavailable("Authentication unavailable")
            }
            AuthError::TokenIssue(e) => {
                tracing::error!("Session token issue failed: {}", e);
                ApiError::internal("Authentication failed")
            }
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::TooLarge { .. } | UploadError::Empty | UploadError::InvalidHandle(_) => {
                ApiError::validation(err.to_string())
            }
            UploadError::NotFound(handle) => ApiError::not_found("File", &handle),
            UploadError::Io(e) => {
                tracing::error!("Upload I/O failed: {}", e);
                ApiError::internal("File operation failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Product", "p-1").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.http_status(), 404);

        let err: ApiError = DbError::Referenced {
            entity: "Category".into(),
            id: "c-1".into(),
            count: 2,
        }
        .into();
        assert_eq!(err.http_status(), 409);

        let err: ApiError = DbError::from(ValidationError::required("name")).into();
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.message, "name is required");

        let err: ApiError = DbError::timeout("get product", 10).into();
        assert_eq!(err.http_status(), 504);

        let err: ApiError = DbError::Unavailable.into();
        assert_eq!(err.http_status(), 503);
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err: ApiError = DbError::QueryFailed("no such table: produtos".into()).into();
        assert_eq!(err.http_status(), 500);
        assert!(!err.message.contains("produtos"));
    }

    #[test]
    fn test_auth_errors_are_401() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(err.http_status(), 401);
        assert_eq!(err.body().erro, "Invalid username or password");
    }

    #[test]
    fn test_error_body_shape() {
        let body = ApiError::not_found("File", "x.png").body();
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"erro":"File not found: x.png"}"#
        );
    }
}

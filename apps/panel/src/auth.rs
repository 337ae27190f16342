//! # Auth Gate
//!
//! Maps credentials to an [`Identity`] carrying a signed session token, and
//! validates that token on later requests. The gate keeps no session table:
//! the token is the session.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  authenticate(user, pass)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CredentialStore::verify ──► None ──► AuthError::InvalidCredentials     │
//! │       │                         (same error for unknown user and        │
//! │       │ Some(principal)          wrong password)                        │
//! │       ▼                                                                 │
//! │  JWT HS256 {sub, name, role, iat, exp, jti} ──► Identity                │
//! │                                                                         │
//! │  authorize(token) ──► decode + check exp ──► Identity                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Credential Stores
//! - [`StaticCredentials`] - one configured pair, for degraded mode
//! - [`StoreCredentials`] - the `users` table, argon2 hashes

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use emporium_core::{User, UserRole};
use emporium_db::{bounded, DbError, StoreHandle};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthSettings;

// =============================================================================
// Errors
// =============================================================================

/// Authentication errors.
///
/// `InvalidCredentials` never says which half of the pair was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired session")]
    InvalidToken,

    /// The credential store could not answer.
    #[error("Credential store error: {0}")]
    Backend(String),

    #[error("Failed to issue session token: {0}")]
    TokenIssue(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        AuthError::Backend(err.to_string())
    }
}

// =============================================================================
// Credential Stores
// =============================================================================

/// Who a verified credential belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
}

/// Checks a username/password pair.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` for an unknown user or a wrong password alike.
    async fn verify(&self, username: &str, password: &str) -> AuthResult<Option<Principal>>;
}

/// A single configured credential pair.
pub struct StaticCredentials {
    username: String,
    password: String,
    display_name: String,
}

impl StaticCredentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        StaticCredentials {
            username: username.into(),
            password: password.into(),
            display_name: display_name.into(),
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(
            settings.username.clone(),
            settings.password.clone(),
            settings.display_name.clone(),
        )
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> AuthResult<Option<Principal>> {
        // Compare both halves so the timing does not reveal which one failed
        let user_ok = username == self.username;
        let password_ok = password == self.password;
        if !(user_ok & password_ok) {
            return Ok(None);
        }

        Ok(Some(Principal {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: UserRole::Admin,
        }))
    }
}

/// Users table with argon2 password hashes.
pub struct StoreCredentials {
    store: StoreHandle,
    op_timeout: Duration,
}

impl StoreCredentials {
    pub fn new(store: StoreHandle, op_timeout: Duration) -> Self {
        StoreCredentials { store, op_timeout }
    }
}

#[async_trait]
impl CredentialStore for StoreCredentials {
    async fn verify(&self, username: &str, password: &str) -> AuthResult<Option<Principal>> {
        let user = bounded(
            "find user",
            self.op_timeout,
            self.store.users().find_by_username(username),
        )
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        if !verify_password(password, &user.password_hash) {
            return Ok(None);
        }

        Ok(Some(Principal {
            username: user.username,
            display_name: user.display_name,
            role: user.role,
        }))
    }
}

/// Creates the default admin user when the users table is empty.
///
/// ## Returns
/// * `true` - A user was created
/// * `false` - Users already exist
pub async fn ensure_default_admin(store: &StoreHandle, settings: &AuthSettings) -> AuthResult<bool> {
    if store.users().count().await? > 0 {
        debug!("Users present, skipping default admin");
        return Ok(false);
    }

    let user = User {
        id: emporium_core::new_id(),
        username: settings.username.clone(),
        display_name: settings.display_name.clone(),
        email: None,
        role: UserRole::Admin,
        password_hash: hash_password(&settings.password)?,
        created_at: emporium_core::now(),
    };
    store.users().insert(&user).await?;

    warn!(
        username = %user.username,
        "Created default admin user. Change its password before going live."
    );
    Ok(true)
}

/// Verifies a password against an argon2 PHC string.
fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> AuthResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Backend(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

// =============================================================================
// Identity
// =============================================================================

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Username.
    sub: String,
    name: String,
    role: UserRole,
    iat: i64,
    exp: i64,
    jti: String,
}

/// An authenticated caller. Only [`AuthGate`] can produce one.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    display_name: String,
    role: UserRole,
    token: String,
    expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Session token to hand back on later requests.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Auth Gate
// =============================================================================

/// Issues and checks session tokens.
pub struct AuthGate {
    credentials: Arc<dyn CredentialStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl AuthGate {
    pub fn new(credentials: Arc<dyn CredentialStore>, secret: &str, lifetime: Duration) -> Self {
        AuthGate {
            credentials,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    /// Checks the pair and opens a session.
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<Identity> {
        match self.credentials.verify(username, password).await? {
            Some(principal) => {
                let identity = self.issue(principal)?;
                info!(username = %identity.username, "Login succeeded");
                Ok(identity)
            }
            None => {
                info!(username = %username, "Login failed");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Validates a session token from an earlier [`authenticate`](Self::authenticate).
    pub fn authorize(&self, token: &str) -> AuthResult<Identity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            AuthError::InvalidToken
        })?;
        let claims = data.claims;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AuthError::InvalidToken)?;

        Ok(Identity {
            username: claims.sub,
            display_name: claims.name,
            role: claims.role,
            token: token.to_string(),
            expires_at,
        })
    }

    fn issue(&self, principal: Principal) -> AuthResult<Identity> {
        let now = Utc::now();
        let lifetime = chrono::Duration::from_std(self.lifetime)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))?;
        let expires_at = now + lifetime;

        let claims = Claims {
            sub: principal.username.clone(),
            name: principal.display_name.clone(),
            role: principal.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))?;

        Ok(Identity {
            username: principal.username,
            display_name: principal.display_name,
            role: principal.role,
            token,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }
}

/// Extracts the token from an `Authorization: Bearer ...` header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use emporium_db::{Database, DbConfig, NullStore};

    fn gate() -> AuthGate {
        AuthGate::new(
            Arc::new(StaticCredentials::new("admin", "admin123", "Administrador")),
            "test-secret",
            Duration::from_secs(1800),
        )
    }

    #[tokio::test]
    async fn test_authenticate_default_pair() {
        let identity = gate().authenticate("admin", "admin123").await.unwrap();
        assert_eq!(identity.username(), "admin");
        assert_eq!(identity.display_name(), "Administrador");
        assert_eq!(identity.role(), UserRole::Admin);
        assert!(identity.expires_at() > Utc::now());
    }

    #[tokio::test]
    async fn test_failures_are_indistinguishable() {
        let gate = gate();
        let wrong_password = gate.authenticate("admin", "wrong").await.unwrap_err();
        let unknown_user = gate.authenticate("nope", "admin123").await.unwrap_err();
        let wrong_case = gate.authenticate("Admin", "admin123").await.unwrap_err();

        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_case, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_authorize_round_trip() {
        let gate = gate();
        let identity = gate.authenticate("admin", "admin123").await.unwrap();

        let again = gate.authorize(identity.token()).unwrap();
        assert_eq!(again.username(), "admin");
        assert_eq!(again.expires_at(), identity.expires_at());
    }

    #[test]
    fn test_authorize_rejects_bad_tokens() {
        let gate = gate();
        assert_eq!(gate.authorize("not-a-jwt"), Err(AuthError::InvalidToken));

        let other = AuthGate::new(
            Arc::new(StaticCredentials::new("admin", "admin123", "Administrador")),
            "another-secret",
            Duration::from_secs(1800),
        );
        let foreign = other
            .issue(Principal {
                username: "admin".into(),
                display_name: "Administrador".into(),
                role: UserRole::Admin,
            })
            .unwrap();
        assert_eq!(gate.authorize(foreign.token()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_rejected() {
        let gate = gate();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "admin".into(),
            name: "Administrador".into(),
            role: UserRole::Admin,
            iat: now - 3600,
            exp: now - 60,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &gate.encoding_key).unwrap();

        assert_eq!(gate.authorize(&token), Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_store_credentials_with_default_admin() {
        let store: StoreHandle = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let settings = AuthSettings::default();

        assert!(ensure_default_admin(&store, &settings).await.unwrap());
        assert!(!ensure_default_admin(&store, &settings).await.unwrap());

        let user = store.users().find_by_username("admin").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "admin123");
        assert!(user.password_hash.starts_with("$argon2"));

        let gate = AuthGate::new(
            Arc::new(StoreCredentials::new(store, Duration::from_secs(5))),
            "test-secret",
            Duration::from_secs(60),
        );
        assert!(gate.authenticate("admin", "admin123").await.is_ok());
        assert_eq!(
            gate.authenticate("admin", "admin1234").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            gate.authenticate("ghost", "admin123").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_unreachable_store_is_a_backend_error() {
        let store: StoreHandle = Arc::new(NullStore::new());
        let err = ensure_default_admin(&store, &AuthSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Backend(_)));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}

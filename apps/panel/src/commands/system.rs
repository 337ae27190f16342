//! # System Commands
//!
//! Login, API status, dashboard counts and image files.

use chrono::{DateTime, Utc};
use emporium_db::DashboardCounts;
use serde::Serialize;

use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::ApiResult;

pub const APP_NAME: &str = "Emporium";

/// Health answer for `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiStatus {
    pub status: &'static str,
    pub app: &'static str,
    pub version: &'static str,
    /// "available" or "unavailable".
    pub store: &'static str,
}

/// A freshly opened session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub display_name: String,
    pub expires_at: DateTime<Utc>,
}

pub fn api_status(ctx: &AppContext) -> ApiStatus {
    ApiStatus {
        status: "online",
        app: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
        store: if ctx.store_available() {
            "available"
        } else {
            "unavailable"
        },
    }
}

/// Checks the credentials and opens a session.
pub async fn login(ctx: &AppContext, username: &str, password: &str) -> ApiResult<Session> {
    let identity = ctx.auth.authenticate(username, password).await?;
    Ok(Session {
        token: identity.token().to_string(),
        username: identity.username().to_string(),
        display_name: identity.display_name().to_string(),
        expires_at: identity.expires_at(),
    })
}

/// Resolves a session token into the identity commands require.
pub fn authorize(ctx: &AppContext, token: &str) -> ApiResult<Identity> {
    Ok(ctx.auth.authorize(token)?)
}

/// Record counts for the landing page.
pub async fn dashboard(ctx: &AppContext, _who: &Identity) -> ApiResult<DashboardCounts> {
    Ok(emporium_db::dashboard_counts(&ctx.entities).await?)
}

/// Stores an image outside of a product form. Returns its handle.
pub async fn upload_image(
    ctx: &AppContext,
    _who: &Identity,
    bytes: &[u8],
    filename: &str,
) -> ApiResult<String> {
    Ok(ctx.blobs.save(bytes, filename).await?)
}

/// Reads an uploaded image. Public, like any static file.
pub async fn fetch_image(ctx: &AppContext, handle: &str) -> ApiResult<Vec<u8>> {
    Ok(ctx.blobs.retrieve(handle).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_api_status() {
        let (ctx, _who, _dir) = context().await;
        let status = api_status(&ctx);
        assert_eq!(status.status, "online");
        assert_eq!(status.app, "Emporium");
        assert_eq!(status.store, "available");
    }

    #[tokio::test]
    async fn test_login_and_authorize() {
        let (ctx, _who, _dir) = context().await;

        let session = login(&ctx, "admin", "admin123").await.unwrap();
        assert_eq!(session.display_name, "Administrador");

        let who = authorize(&ctx, &session.token).unwrap();
        assert_eq!(who.username(), "admin");

        let err = login(&ctx, "admin", "wrong").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(authorize(&ctx, "garbage").unwrap_err().http_status(), 401);
    }

    #[tokio::test]
    async fn test_dashboard_and_images() {
        let (ctx, who, _dir) = context().await;

        let counts = dashboard(&ctx, &who).await.unwrap();
        assert_eq!(counts, DashboardCounts::default());

        let handle = upload_image(&ctx, &who, b"GIF89a", "logo.gif").await.unwrap();
        assert_eq!(fetch_image(&ctx, &handle).await.unwrap(), b"GIF89a");

        let err = fetch_image(&ctx, "../panel.toml").await.unwrap_err();
        assert_eq!(err.http_status(), 400);
        let err = fetch_image(&ctx, "missing.gif").await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }
}

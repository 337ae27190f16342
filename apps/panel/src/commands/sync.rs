//! # Sync Commands
//!
//! Control and status of the background sync engine. When the panel runs
//! without an engine (store down, sync disabled) the status still answers
//! and every control command is a 503.

use emporium_core::{SyncCounts, SyncRecord};
use emporium_sync::SyncEngine;
use serde::Serialize;
use tracing::info;

use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};

/// Sync status as shown on the status page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatusView {
    /// Whether this panel has a sync engine at all.
    pub enabled: bool,
    #[serde(flatten)]
    pub record: SyncRecord,
}

fn engine(ctx: &AppContext) -> ApiResult<&SyncEngine> {
    ctx.sync
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("Sync is not configured"))
}

pub async fn sync_status(ctx: &AppContext, _who: &Identity) -> ApiResult<SyncStatusView> {
    Ok(match &ctx.sync {
        Some(engine) => SyncStatusView {
            enabled: true,
            record: engine.status().await,
        },
        None => SyncStatusView {
            enabled: false,
            record: SyncRecord::default(),
        },
    })
}

/// Starts the schedule. `false` if it was already running.
pub async fn start_sync(ctx: &AppContext, who: &Identity) -> ApiResult<bool> {
    let started = engine(ctx)?.start().await;
    info!(started, user = %who.username(), "Sync start requested");
    Ok(started)
}

/// Stops the schedule. `false` if it was not running.
pub async fn stop_sync(ctx: &AppContext, who: &Identity) -> ApiResult<bool> {
    let stopped = engine(ctx)?.stop().await;
    info!(stopped, user = %who.username(), "Sync stop requested");
    Ok(stopped)
}

/// Runs a pass now and returns its counts.
pub async fn force_sync(ctx: &AppContext, who: &Identity) -> ApiResult<SyncCounts> {
    info!(user = %who.username(), "Sync pass requested");
    Ok(engine(ctx)?.force_sync().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentials;
    use crate::commands::category::{create_category, list_categories};
    use crate::commands::test_support::context;
    use crate::config::PanelConfig;
    use emporium_core::{CategoryDraft, CategoryFilter, SyncState};
    use emporium_db::{Database, DbConfig, StoreHandle};
    use emporium_sync::{SyncEngineBuilder, SyncSettings};
    use std::sync::Arc;

    async fn memory_store() -> StoreHandle {
        Arc::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    #[tokio::test]
    async fn test_without_engine() {
        let (ctx, who, _dir) = context().await;

        let status = sync_status(&ctx, &who).await.unwrap();
        assert!(!status.enabled);
        assert_eq!(status.record.state, SyncState::Idle);

        let err = force_sync(&ctx, &who).await.unwrap_err();
        assert_eq!(err.http_status(), 503);
    }

    #[tokio::test]
    async fn test_force_sync_copies_to_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PanelConfig::default();
        config.uploads.dir = dir.path().join("uploads");

        let main = memory_store().await;
        let cache = memory_store().await;
        let engine = SyncEngineBuilder::new(SyncSettings::default())
            .with_local(cache.clone())
            .with_remote(main.clone())
            .build()
            .unwrap();

        let credentials = Arc::new(StaticCredentials::from_settings(&config.auth));
        let ctx = AppContext::assemble(config, Some(main), credentials, Some(engine), Some(cache.clone()));
        let who = ctx.auth.authenticate("admin", "admin123").await.unwrap();

        create_category(
            &ctx,
            &who,
            CategoryDraft {
                name: "Bebidas".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let counts = force_sync(&ctx, &who).await.unwrap();
        assert_eq!(counts.pulled, 1);
        assert_eq!(cache.categories().count().await.unwrap(), 1);
        assert_eq!(
            list_categories(&ctx, &who, &CategoryFilter::default()).await.unwrap().len(),
            1
        );

        assert!(start_sync(&ctx, &who).await.unwrap());
        assert!(!start_sync(&ctx, &who).await.unwrap());
        assert!(sync_status(&ctx, &who).await.unwrap().record.is_running());
        assert!(stop_sync(&ctx, &who).await.unwrap());

        let status = sync_status(&ctx, &who).await.unwrap();
        assert!(status.enabled);
        assert_eq!(status.record.state, SyncState::Stopped);
        assert!(status.record.last_success.is_some());

        ctx.shutdown().await;
    }
}

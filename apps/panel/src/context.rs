//! # Application Context
//!
//! Everything a command needs, built once at startup and passed by
//! reference. There is no global state.
//!
//! ## Bootstrap
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open main store (SQLite + migrations)                                  │
//! │     │                                                                   │
//! │     ├── ok ──► StoreCredentials, ensure default admin                   │
//! │     │          open cache ──► SyncEngine(local = cache, remote = main)  │
//! │     │                         start when auto_start                     │
//! │     │                                                                   │
//! │     └── err ─► NullStore (reads empty, writes "unavailable")            │
//! │                StaticCredentials, no sync engine                        │
//! │                                                                         │
//! │  Neither branch fails: a dead store degrades the panel instead of       │
//! │  stopping it.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use emporium_db::{Database, DbConfig, EntityStore, NullStore, StockLedger, StoreHandle};
use emporium_sync::{SyncEngine, SyncEngineBuilder};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{ensure_default_admin, AuthGate, CredentialStore, StaticCredentials, StoreCredentials};
use crate::config::PanelConfig;
use crate::uploads::{BlobStore, FsBlobStore};

/// Shared application state.
pub struct AppContext {
    pub config: PanelConfig,
    /// `None` when the main store could not be opened.
    pub store: Option<StoreHandle>,
    pub entities: EntityStore,
    pub ledger: StockLedger,
    pub auth: AuthGate,
    pub blobs: Arc<dyn BlobStore>,
    pub sync: Option<SyncEngine>,
    cache: Option<StoreHandle>,
}

impl AppContext {
    /// Opens the stores and builds every component. Never fails.
    pub async fn bootstrap(config: PanelConfig) -> Self {
        let store: Option<StoreHandle> =
            match Database::new(DbConfig::new(&config.store.database_path)).await {
                Ok(db) => {
                    info!(path = ?config.store.database_path, "Main store opened");
                    Some(Arc::new(db))
                }
                Err(e) => {
                    error!(
                        error = %e,
                        path = ?config.store.database_path,
                        "Main store unavailable, running in degraded mode"
                    );
                    None
                }
            };

        let Some(live) = store.clone() else {
            let credentials = Arc::new(StaticCredentials::from_settings(&config.auth));
            return Self::assemble(config, None, credentials, None, None);
        };

        if let Err(e) = ensure_default_admin(&live, &config.auth).await {
            warn!(error = %e, "Could not check for a default admin user");
        }
        let credentials = Arc::new(StoreCredentials::new(
            live.clone(),
            config.store.op_timeout(),
        ));

        let (sync, cache) = if config.sync.enabled {
            Self::start_sync(&config, live.clone()).await
        } else {
            info!("Sync disabled by configuration");
            (None, None)
        };

        Self::assemble(config, store, credentials, sync, cache)
    }

    /// Builds a context around an already opened store.
    ///
    /// `store: None` selects degraded mode.
    pub fn assemble(
        config: PanelConfig,
        store: Option<StoreHandle>,
        credentials: Arc<dyn CredentialStore>,
        sync: Option<SyncEngine>,
        cache: Option<StoreHandle>,
    ) -> Self {
        let handle: StoreHandle = store.clone().unwrap_or_else(|| Arc::new(NullStore::new()));
        let op_timeout = config.store.op_timeout();

        let entities = EntityStore::new(handle.clone()).with_timeout(op_timeout);
        let ledger = StockLedger::new(handle).with_timeout(op_timeout);
        let auth = AuthGate::new(
            credentials,
            &config.server.secret_key,
            config.auth.session_lifetime(),
        );
        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::from_settings(&config.uploads));

        if config.uses_development_key() {
            warn!("Using the development secret key. Set SECRET_KEY in production.");
        }

        AppContext {
            config,
            store,
            entities,
            ledger,
            auth,
            blobs,
            sync,
            cache,
        }
    }

    async fn start_sync(
        config: &PanelConfig,
        remote: StoreHandle,
    ) -> (Option<SyncEngine>, Option<StoreHandle>) {
        let cache: StoreHandle = match Database::new(DbConfig::new(&config.sync.cache_path)).await {
            Ok(db) => Arc::new(db),
            Err(e) => {
                warn!(error = %e, path = ?config.sync.cache_path, "Cache unavailable, sync disabled");
                return (None, None);
            }
        };

        let engine = match SyncEngineBuilder::new(config.sync.clone())
            .with_local(cache.clone())
            .with_remote(remote)
            .build()
        {
            Ok(engine) => engine,
            Err(e) => {
                warn!(error = %e, "Sync engine not built");
                cache.close().await;
                return (None, None);
            }
        };

        if config.sync.auto_start {
            engine.start().await;
        }
        (Some(engine), Some(cache))
    }

    /// `true` when the main store is live.
    pub fn store_available(&self) -> bool {
        self.store.is_some()
    }

    /// Stops the sync engine and releases every pool.
    pub async fn shutdown(&self) {
        if let Some(sync) = &self.sync {
            sync.stop().await;
        }
        if let Some(cache) = &self.cache {
            cache.close().await;
        }
        if let Some(store) = &self.store {
            store.close().await;
        }
        info!("Panel context shut down");
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("store_available", &self.store_available())
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> PanelConfig {
        let mut config = PanelConfig::default();
        config.store.database_path = dir.join("emporium.db");
        config.sync.cache_path = dir.join("cache.db");
        config.uploads.dir = dir.join("uploads");
        config
    }

    #[tokio::test]
    async fn test_bootstrap_live_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.sync.auto_start = false;

        let ctx = AppContext::bootstrap(config).await;
        assert!(ctx.store_available());
        assert!(ctx.sync.is_some());
        assert!(ctx.auth.authenticate("admin", "admin123").await.is_ok());

        let counts = ctx.sync.as_ref().unwrap().force_sync().await.unwrap();
        assert_eq!(counts.total_changes(), 0);

        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_bootstrap_degrades_without_store() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the database file should be cannot be opened
        let blocked = dir.path().join("blocked");
        std::fs::create_dir_all(&blocked).unwrap();

        let mut config = config_in(dir.path());
        config.store.database_path = blocked;

        let ctx = AppContext::bootstrap(config).await;
        assert!(!ctx.store_available());
        assert!(ctx.sync.is_none());

        // Static credentials still admit the configured pair
        assert!(ctx.auth.authenticate("admin", "admin123").await.is_ok());
        assert!(ctx.entities.customers().get_all(&Default::default()).await.unwrap().is_empty());

        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_bootstrap_without_sync() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.sync.enabled = false;

        let ctx = AppContext::bootstrap(config).await;
        assert!(ctx.store_available());
        assert!(ctx.sync.is_none());
        ctx.shutdown().await;
    }
}

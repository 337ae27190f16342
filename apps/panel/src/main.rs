//! # Emporium Panel
//!
//! Loads the configuration, opens the stores, starts the sync engine and
//! runs until a shutdown signal arrives.
//!
//! ```text
//! panel [--config <path>]
//! ```

use std::path::PathBuf;

use anyhow::bail;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use emporium_panel::commands::system::api_status;
use emporium_panel::{AppContext, PanelConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,emporium=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting Emporium panel...");

    let config_path = parse_args()?;
    let config = PanelConfig::load_or_default(config_path);
    info!(
        port = config.server.port,
        db = ?config.store.database_path,
        sync = config.sync.enabled,
        "Configuration loaded"
    );

    let ctx = AppContext::bootstrap(config).await;

    let status = api_status(&ctx);
    if ctx.store_available() {
        info!(version = status.version, store = status.store, "Panel ready");
    } else {
        warn!(version = status.version, store = status.store, "Panel ready in degraded mode");
    }

    shutdown_signal().await;

    ctx.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

fn parse_args() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => match args.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => bail!("{} needs a path", arg),
            },
            other => bail!("Unknown argument: {}", other),
        }
    }
    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

//! vl-server: video lifecycle orchestration, shared links, and the HTTP API.
//!
//! This crate ties the other vl-* crates into a running service:
//!
//! - [`lifecycle::VideoLifecycle`] -- upload validation, trim, merge
//! - [`links::LinkManager`] -- issue, resolve and stream time-limited links
//! - [`reconcile`] -- startup cleanup of interrupted writes
//! - Axum-based HTTP API with API-key auth and request IDs
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod lifecycle;
pub mod links;
pub mod middleware;
pub mod reconcile;
pub mod router;
pub mod routes;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use vl_av::{FfmpegTranscoder, Transcoder};
use vl_core::config::Config;
use vl_core::{Error, Result};
use vl_db::pool::DbPool;

use crate::context::AppContext;
use crate::storage::Storage;

/// Open (or create) the database at `config.server.db_path`.
pub fn open_database(config: &Config) -> Result<DbPool> {
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = vl_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }
    Ok(db)
}

/// Ensure the storage layout exists and reconcile interrupted writes.
pub fn prepare_storage(config: &Config, db: &DbPool) -> Result<Storage> {
    let storage = Storage::new(config.storage.root_dir.clone());
    storage.ensure_layout()?;
    reconcile::reconcile(db, &storage)?;
    Ok(storage)
}

/// Start the vidlink server.
///
/// Initializes the database, reconciles storage, discovers ffmpeg/ffprobe
/// and serves HTTP until a shutdown signal is received.
pub async fn start(config: Config) -> Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let db = open_database(&config)?;
    let storage = prepare_storage(&config, &db)?;

    let transcoder = FfmpegTranscoder::new(&config.tools, &config.transcode, storage.staging_dir());
    for info in transcoder.tools().check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::warn!("Tool not found: {}; video processing will fail", info.name);
        }
    }
    tracing::info!(
        max_concurrent = transcoder.gate().capacity(),
        "Transcode gate configured"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid server address: {e}")))?;

    let transcoder: Arc<dyn Transcoder> = Arc::new(transcoder);
    let ctx = AppContext::new(config, db, transcoder);
    let app = router::build_router(ctx);

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}

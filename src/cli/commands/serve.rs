//! Serve command: run the HTTP API until interrupted.

use crate::cli::ServeArgs;
use crate::config::{ServerConfig, resolve_db_path};
use crate::error::{Error, Result};
use crate::http::{AppState, build_router};
use crate::storage::SqliteStorage;
use colored::Colorize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Execute the serve command.
///
/// Opens the database created by `yousoul init`, then serves on the
/// configured address until Ctrl-C.
///
/// # Errors
///
/// Returns `Config` for invalid settings, `NotInitialized` when the database
/// does not exist, or an error if the address cannot be bound.
pub fn execute(args: &ServeArgs, db_path: Option<&PathBuf>) -> Result<()> {
    let config = ServerConfig::from(args);
    config.validate()?;

    let db_path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine database location".to_string()))?;
    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }
    let storage = SqliteStorage::open(&db_path)?;

    if config.storage_secret.is_empty() {
        warn!("YOUSOUL_STORAGE_SECRET is empty; presigned URLs are not protected");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(config, storage, db_path))
}

async fn run(config: ServerConfig, storage: SqliteStorage, db_path: PathBuf) -> Result<()> {
    let identity = config.identity()?;
    let presigner = config.presigner()?;
    let auth = identity.name();
    let bind = config.bind.clone();

    let state = AppState::with_config(storage, identity, presigner, config);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    let addr = listener.local_addr()?;

    info!(%addr, auth, db = %db_path.display(), "Listening");
    eprintln!("{} listening on http://{addr}", "YouSoul API".green().bold());

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

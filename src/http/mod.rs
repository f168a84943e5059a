//! HTTP API.
//!
//! An axum router over [`AppState`]. Every route except the health check
//! requires an authenticated caller, and every read or write is scoped to
//! that caller's rows.
//!
//! # Submodules
//!
//! - [`dto`] - Request bodies and their validation
//! - [`handlers`] - Route handlers
//! - [`middleware`] - Request id and tracing
//! - [`response`] - Success envelope, error bodies, and extractors

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod response;

use crate::auth::SharedIdentity;
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::reflections::Presigner;
use crate::storage::SqliteStorage;
use axum::Router;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use std::sync::{Arc, Mutex};

/// Name reported by the health check.
pub const APP_NAME: &str = "YouSoul";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<SqliteStorage>>,
    pub identity: SharedIdentity,
    pub presigner: Arc<dyn Presigner>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// State with default settings and the given collaborators.
    #[must_use]
    pub fn new(
        storage: SqliteStorage,
        identity: SharedIdentity,
        presigner: Arc<dyn Presigner>,
    ) -> Self {
        Self::with_config(storage, identity, presigner, ServerConfig::default())
    }

    #[must_use]
    pub fn with_config(
        storage: SqliteStorage,
        identity: SharedIdentity,
        presigner: Arc<dyn Presigner>,
        config: ServerConfig,
    ) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            identity,
            presigner,
            config: Arc::new(config),
        }
    }

    /// Run a storage call on the blocking pool.
    ///
    /// SQLite calls block, so they never run on the async workers. The mutex
    /// serializes access to the single connection.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or `Other` if the lock is poisoned or the
    /// blocking task panics.
    pub async fn with_storage<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut SqliteStorage) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let mut guard = storage
                .lock()
                .map_err(|_| Error::Other("storage lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| Error::Other(format!("storage task failed: {e}")))?
    }
}

impl FromRef<AppState> for SharedIdentity {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.identity)
    }
}

/// Build the router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/api/public/health", get(handlers::health))
        .route("/api/me", get(handlers::me))
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/api/tasks/reorder", post(handlers::reorder_tasks))
        .route(
            "/api/tasks/:id",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route(
            "/api/preferences",
            get(handlers::get_preferences).put(handlers::put_preferences),
        )
        .route("/api/activity", get(handlers::activity))
        .route(
            "/api/reflections/upload-url",
            post(handlers::reflection_upload_url),
        )
        .route(
            "/api/reflections/download-url",
            get(handlers::reflection_download_url),
        )
        .fallback(handlers::not_found)
        .layer(from_fn(middleware::trace_requests))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

//! Configuration management.
//!
//! Resolves the database location and the server settings. Every server
//! setting can come from a CLI flag or its `YOUSOUL_*` environment variable;
//! the clap definitions in [`crate::cli`] wire those up and hand the result
//! to [`ServerConfig`].
//!
//! # Database location
//!
//! One database per installation at `~/.yousoul/data/yousoul.db`, shared by
//! every user the server handles. Rows are scoped by user id.

use crate::auth::{HeaderIdentity, SharedIdentity, StaticTokenIdentity};
use crate::error::{Error, Result};
use crate::reflections::{Presigner, SignedUrlPresigner};

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_BUCKET: &str = "reflections";
pub const DEFAULT_STORAGE_URL: &str = "http://127.0.0.1:9000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Get the global YouSoul directory location (`~/.yousoul/`).
#[must_use]
pub fn global_yousoul_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".yousoul"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `YOUSOUL_TEST_DB=1` (or any non-empty value).
/// This redirects all database operations to an isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("YOUSOUL_TEST_DB")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

/// Get the test database path: `~/.yousoul/test/yousoul.db`.
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_yousoul_dir().map(|dir| dir.join("test").join("yousoul.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `YOUSOUL_TEST_DB` environment variable → uses test database
/// 3. `YOUSOUL_DB` environment variable
/// 4. Global location: `~/.yousoul/data/yousoul.db`
///
/// Returns `None` if no home directory can be determined.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var("YOUSOUL_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_yousoul_dir().map(|dir| dir.join("data").join("yousoul.db"))
}

/// How callers are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AuthMode {
    /// Trust `x-user-*` headers from an authenticating proxy
    #[default]
    Header,
    /// Static bearer tokens from `YOUSOUL_TOKENS`
    Token,
}

/// Settings for `yousoul serve`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Base URL of the object storage gateway used for presigned URLs
    pub storage_url: String,
    pub storage_secret: String,
    pub bucket: String,
    pub auth: AuthMode,
    /// `token=user_id` pairs, comma separated (token mode only)
    pub tokens: Option<String>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            storage_secret: String::new(),
            bucket: DEFAULT_BUCKET.to_string(),
            auth: AuthMode::default(),
            tokens: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Build the identity provider for the configured auth mode.
    ///
    /// # Errors
    ///
    /// Returns `Config` in token mode when no valid tokens are configured.
    pub fn identity(&self) -> Result<SharedIdentity> {
        match self.auth {
            AuthMode::Header => Ok(Arc::new(HeaderIdentity)),
            AuthMode::Token => {
                let tokens = StaticTokenIdentity::parse(self.tokens.as_deref().unwrap_or(""))?;
                if tokens.is_empty() {
                    return Err(Error::Config(
                        "token auth needs at least one YOUSOUL_TOKENS entry".into(),
                    ));
                }
                Ok(Arc::new(tokens))
            }
        }
    }

    /// Build the presigner for reflection photos.
    ///
    /// # Errors
    ///
    /// Returns `Config` when the storage URL is invalid.
    pub fn presigner(&self) -> Result<Arc<dyn Presigner>> {
        Ok(Arc::new(SignedUrlPresigner::new(
            &self.storage_url,
            &self.storage_secret,
        )?))
    }

    /// Reject settings the server cannot start with.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() || self.bucket.contains('/') {
            return Err(Error::Config(format!("invalid bucket name '{}'", self.bucket)));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::Config("max body size must be positive".into()));
        }
        self.identity()?;
        self.presigner()?;
        Ok(())
    }
}

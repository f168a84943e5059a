//! Initialize the YouSoul database.
//!
//! Creates the data directory and the database file, then applies the schema
//! so `serve` starts against a ready database. When `YOUSOUL_TEST_DB=1` is
//! set the default location moves to `~/.yousoul/test/yousoul.db`.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitOutput {
    database: PathBuf,
    schema_version: i32,
    recreated: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` when the database exists and `force` is not
/// set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine database location".to_string()))?;

    let recreated = init_database(&db_path, force)?;

    if json {
        let output = InitOutput {
            database: db_path,
            schema_version: CURRENT_SCHEMA_VERSION,
            recreated,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        let verb = if recreated { "Recreated" } else { "Initialized" };
        println!("{} YouSoul database", verb.green());
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: run {} to start the API.", "yousoul serve".bold());
    }

    Ok(())
}

/// Create (or with `force`, recreate) the database at `db_path`.
///
/// Returns whether an existing database was replaced.
fn init_database(db_path: &Path, force: bool) -> Result<bool> {
    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized {
            path: db_path.to_path_buf(),
        });
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if existed {
        fs::remove_file(db_path)?;
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = db_path.as_os_str().to_owned();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
    }

    SqliteStorage::open(db_path)?;
    info!(path = %db_path.display(), recreated = existed, "Database initialized");
    Ok(existed)
}

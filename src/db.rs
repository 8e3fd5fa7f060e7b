use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::config::Config;
use crate::sqlite_functions;

/// Collation declared by the catalog schema. Must exist on every
/// connection or queries touching those columns fail.
pub const CATALOG_COLLATION: &str = "MHL_SYSTEM_NOCASE";

fn catalog_pool_options(max_connections: u32) -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move { sqlite_functions::register(conn).await })
        })
}

fn catalog_options(path: &Path) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .collation(CATALOG_COLLATION, |a: &str, b: &str| {
            a.to_lowercase().cmp(&b.to_lowercase())
        });
    Ok(options)
}

/// Opens the library catalog read-only.
pub async fn connect_catalog(config: &Config) -> Result<SqlitePool> {
    let path = &config.catalog.path;
    if !path.exists() {
        anyhow::bail!("Catalog not found: {}", path.display());
    }

    let options = catalog_options(path)?.read_only(true);

    let pool = catalog_pool_options(config.catalog.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open catalog: {}", path.display()))?;

    Ok(pool)
}

/// Opens the catalog for writing, creating it if missing. Only used to
/// build empty development catalogs.
pub async fn connect_catalog_rw(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = catalog_options(path)?.create_if_missing(true);

    let pool = catalog_pool_options(1).connect_with(options)
        .await?;

    Ok(pool)
}

/// Opens the per-user settings database, creating it if missing.
pub async fn connect_settings(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.settings.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

//! Wiring: builds a [`LibraryService`] over the SQLite backends.

use std::sync::Arc;

use anyhow::Result;

use booklens_core::engine::SearchEngine;
use booklens_core::service::LibraryService;
use booklens_core::session::InMemorySessionStore;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_catalog::SqliteCatalog;
use crate::sqlite_settings::SqliteSettingsStore;

pub type Service = LibraryService<SqliteCatalog, SqliteSettingsStore>;

/// Opens both databases, brings the settings schema up to date and
/// returns a ready service with an empty session store.
pub async fn build_service(config: &Config) -> Result<Service> {
    let catalog_pool = db::connect_catalog(config).await?;
    let settings_pool = db::connect_settings(config).await?;
    migrate::migrate_settings(&settings_pool).await?;

    let engine = SearchEngine::new(SqliteCatalog::new(catalog_pool));
    let settings = SqliteSettingsStore::new(settings_pool, config.search.default_max_books);

    Ok(LibraryService::new(
        engine,
        settings,
        Arc::new(InMemorySessionStore::new()),
        config.service_options(),
    ))
}

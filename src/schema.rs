//! Empty catalog schema for development and tests.
//!
//! Production catalogs are built elsewhere and only ever read. This creates
//! the subset of tables and columns the search view touches, with the same
//! names and the catalog's own collation on the series title.

use anyhow::Result;
use sqlx::SqlitePool;

const CATALOG_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS Books (
        BookID INTEGER PRIMARY KEY,
        Title TEXT NOT NULL,
        SearchTitle TEXT,
        Lang TEXT,
        SearchLang TEXT,
        BookSize INTEGER NOT NULL DEFAULT 0,
        Folder TEXT,
        FileName TEXT NOT NULL,
        Ext TEXT,
        UpdateDate TEXT,
        SeriesID INTEGER,
        LibRate INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS Authors (
        AuthorID INTEGER PRIMARY KEY,
        LastName TEXT,
        FirstName TEXT,
        MiddleName TEXT,
        SearchName TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS Author_List (
        AuthorID INTEGER NOT NULL,
        BookID INTEGER NOT NULL,
        PRIMARY KEY (AuthorID, BookID)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS Series (
        SeriesID INTEGER PRIMARY KEY,
        SeriesTitle TEXT NOT NULL COLLATE MHL_SYSTEM_NOCASE,
        SearchSeriesTitle TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS SearchGenres (
        GenreCode TEXT PRIMARY KEY,
        ParentCode TEXT NOT NULL DEFAULT '0',
        GenreAlias TEXT NOT NULL,
        SearchGenre TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS Genre_List (
        GenreCode TEXT NOT NULL,
        BookID INTEGER NOT NULL,
        PRIMARY KEY (GenreCode, BookID)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS Books_Meta (
        BookID INTEGER PRIMARY KEY,
        Publisher TEXT,
        Year TEXT,
        City TEXT,
        ISBN TEXT,
        SearchYear INTEGER,
        SearchPublisher TEXT,
        SearchCity TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_books_filename ON Books(FileName)",
    "CREATE INDEX IF NOT EXISTS idx_author_list_book ON Author_List(BookID)",
    "CREATE INDEX IF NOT EXISTS idx_genre_list_book ON Genre_List(BookID)",
];

/// Creates the catalog tables if they do not exist. Idempotent.
///
/// The pool must have the catalog collation registered (see
/// [`crate::db::connect_catalog_rw`]).
pub async fn create_catalog_schema(pool: &SqlitePool) -> Result<()> {
    for statement in CATALOG_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Run the init-catalog command: create an empty catalog at the
/// configured path.
pub async fn run_init_catalog(config: &crate::config::Config) -> Result<()> {
    let path = &config.catalog.path;
    let pool = crate::db::connect_catalog_rw(path).await?;
    create_catalog_schema(&pool).await?;
    pool.close().await;
    tracing::info!(path = %path.display(), "catalog schema created");
    Ok(())
}

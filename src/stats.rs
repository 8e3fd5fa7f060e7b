//! Library statistics.
//!
//! A quick summary of the catalog being served: how many books, authors,
//! genres, series and languages it holds and when it was last refreshed.
//! Used by `booklens stats`.

use anyhow::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibraryStats {
    pub last_update: Option<String>,
    pub books_count: i64,
    /// Highest numeric file name, a proxy for the newest catalog entry.
    pub max_file_name: Option<i64>,
    pub authors_count: i64,
    pub genres_count: i64,
    pub series_count: i64,
    pub languages_count: i64,
}

pub async fn library_stats(pool: &SqlitePool) -> Result<LibraryStats> {
    let books = sqlx::query(
        r#"
        SELECT
            MAX(UpdateDate) AS last_update,
            COUNT(*) AS books_count,
            MAX(CAST(FileName AS INTEGER)) AS max_file_name
        FROM Books
        "#,
    )
    .fetch_one(pool)
    .await?;

    let count = |sql: &'static str| async move {
        let n: i64 = sqlx::query_scalar(sql).fetch_one(pool).await?;
        anyhow::Ok(n)
    };

    Ok(LibraryStats {
        last_update: books.try_get("last_update")?,
        books_count: books.try_get("books_count")?,
        max_file_name: books.try_get("max_file_name")?,
        authors_count: count("SELECT COUNT(*) FROM Authors").await?,
        genres_count: count("SELECT COUNT(*) FROM SearchGenres").await?,
        series_count: count("SELECT COUNT(*) FROM Series").await?,
        languages_count: count("SELECT COUNT(DISTINCT SearchLang) FROM Books").await?,
    })
}

/// Run the stats command: query the catalog and print a summary.
pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let pool = db::connect_catalog(config).await?;
    let stats = library_stats(&pool).await?;
    pool.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let db_size = std::fs::metadata(&config.catalog.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Booklens — Library Stats");
    println!("========================");
    println!();
    println!("  Catalog:     {}", config.catalog.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!(
        "  Updated:     {}",
        stats.last_update.as_deref().unwrap_or("never")
    );
    println!();
    println!("  Books:       {}", stats.books_count);
    println!(
        "  Last file:   {}",
        stats
            .max_file_name
            .map(|n| n.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    );
    println!("  Authors:     {}", stats.authors_count);
    println!("  Genres:      {}", stats.genres_count);
    println!("  Series:      {}", stats.series_count);
    println!("  Languages:   {}", stats.languages_count);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect_settings(config).await?;
    migrate_settings(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates the settings schema on an open pool. Idempotent.
pub async fn migrate_settings(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS UserSettings (
            User_ID INTEGER NOT NULL UNIQUE,
            MaxBooks INTEGER NOT NULL DEFAULT 20,
            Lang VARCHAR(2) DEFAULT '',
            DateSortOrder VARCHAR(10) DEFAULT 'DESC',
            PRIMARY KEY(User_ID)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Columns added after the first release
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('UserSettings')")
            .fetch_all(pool)
            .await?;

    let added = [
        ("BookFormat", "VARCHAR(10) DEFAULT 'fb2'"),
        ("LastNewsDate", "VARCHAR(10) DEFAULT '2000-01-01'"),
        ("IsBlocked", "BOOLEAN DEFAULT FALSE"),
    ];
    for (name, definition) in added {
        if !columns.iter().any(|c| c == name) {
            sqlx::query(&format!(
                "ALTER TABLE UserSettings ADD COLUMN {} {}",
                name, definition
            ))
            .execute(pool)
            .await?;
        }
    }

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS IXUserSettings_User_ID ON UserSettings (User_ID)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

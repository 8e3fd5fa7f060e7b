//! SQLite-backed [`SettingsStore`].
//!
//! One row per user in `UserSettings`. Values that do not parse back into
//! their typed form (a hand-edited sort order, a three-letter language)
//! read as the default for that field.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use booklens_core::models::{LangCode, SettingsUpdate, UserId, UserSettings};
use booklens_core::settings::SettingsStore;

pub struct SqliteSettingsStore {
    pool: SqlitePool,
    default_max_books: u32,
}

impl SqliteSettingsStore {
    pub fn new(pool: SqlitePool, default_max_books: u32) -> Self {
        Self {
            pool,
            default_max_books,
        }
    }

    async fn fetch(&self, user_id: UserId) -> Result<Option<UserSettings>> {
        let row = sqlx::query(
            r#"
            SELECT User_ID, MaxBooks, Lang, DateSortOrder, BookFormat, LastNewsDate, IsBlocked
            FROM UserSettings
            WHERE User_ID = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_settings(&r)).transpose()
    }
}

fn row_to_settings(row: &SqliteRow) -> Result<UserSettings> {
    let user_id: UserId = row.try_get("User_ID")?;
    let defaults = UserSettings::defaults(user_id);

    let max_books: i64 = row.try_get("MaxBooks")?;
    let lang: Option<String> = row.try_get("Lang")?;
    let sort: Option<String> = row.try_get("DateSortOrder")?;
    let format: Option<String> = row.try_get("BookFormat")?;
    let news: Option<String> = row.try_get("LastNewsDate")?;
    let blocked: Option<bool> = row.try_get("IsBlocked")?;

    Ok(UserSettings {
        user_id,
        max_books: u32::try_from(max_books).unwrap_or(defaults.max_books),
        lang: lang.as_deref().and_then(LangCode::parse),
        date_sort_order: sort
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.date_sort_order),
        book_format: format
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.book_format),
        last_news_date: news
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .unwrap_or(defaults.last_news_date),
        is_blocked: blocked.unwrap_or(false),
    })
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get_or_create(&self, user_id: UserId) -> Result<UserSettings> {
        if let Some(settings) = self.fetch(user_id).await? {
            return Ok(settings);
        }

        sqlx::query("INSERT OR IGNORE INTO UserSettings (User_ID, MaxBooks) VALUES (?, ?)")
            .bind(user_id)
            .bind(self.default_max_books as i64)
            .execute(&self.pool)
            .await?;
        tracing::debug!(user_id, "created default settings");

        self.fetch(user_id)
            .await?
            .with_context(|| format!("settings row for user {} vanished after insert", user_id))
    }

    async fn update(&self, user_id: UserId, change: SettingsUpdate) -> Result<UserSettings> {
        // Make sure the row exists first
        self.get_or_create(user_id).await?;

        let query = match &change {
            SettingsUpdate::MaxBooks(n) => {
                sqlx::query("UPDATE UserSettings SET MaxBooks = ? WHERE User_ID = ?").bind(*n as i64)
            }
            SettingsUpdate::Lang(lang) => sqlx::query("UPDATE UserSettings SET Lang = ? WHERE User_ID = ?")
                .bind(lang.as_ref().map(|l| l.as_str().to_string()).unwrap_or_default()),
            SettingsUpdate::DateSortOrder(order) => {
                sqlx::query("UPDATE UserSettings SET DateSortOrder = ? WHERE User_ID = ?")
                    .bind(order.as_sql())
            }
            SettingsUpdate::BookFormat(format) => {
                sqlx::query("UPDATE UserSettings SET BookFormat = ? WHERE User_ID = ?")
                    .bind(format.to_string())
            }
            SettingsUpdate::LastNewsDate(date) => {
                sqlx::query("UPDATE UserSettings SET LastNewsDate = ? WHERE User_ID = ?")
                    .bind(date.format("%Y-%m-%d").to_string())
            }
            SettingsUpdate::Blocked(blocked) => {
                sqlx::query("UPDATE UserSettings SET IsBlocked = ? WHERE User_ID = ?").bind(*blocked)
            }
        };
        query.bind(user_id).execute(&self.pool).await?;

        self.fetch(user_id)
            .await?
            .with_context(|| format!("no settings row for user {}", user_id))
    }
}

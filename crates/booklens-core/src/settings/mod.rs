//! Persistent per-user preferences.
//!
//! The [`SettingsStore`] trait is implemented by the SQLite store in the
//! `booklens` crate and by [`memory::InMemorySettingsStore`] for tests and
//! throwaway runs.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{SettingsUpdate, UserId, UserSettings};

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the user's settings, first inserting
    /// [`UserSettings::defaults`] if the user has none.
    async fn get_or_create(&self, user_id: UserId) -> Result<UserSettings>;

    /// Applies one change and returns the updated record.
    async fn update(&self, user_id: UserId, change: SettingsUpdate) -> Result<UserSettings>;
}

/// Applies `change` to an in-memory record.
pub fn apply_update(settings: &mut UserSettings, change: SettingsUpdate) {
    match change {
        SettingsUpdate::MaxBooks(n) => settings.max_books = n,
        SettingsUpdate::Lang(lang) => settings.lang = lang,
        SettingsUpdate::DateSortOrder(order) => settings.date_sort_order = order,
        SettingsUpdate::BookFormat(format) => settings.book_format = format,
        SettingsUpdate::LastNewsDate(date) => settings.last_news_date = date,
        SettingsUpdate::Blocked(blocked) => settings.is_blocked = blocked,
    }
}

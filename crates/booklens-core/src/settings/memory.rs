//! In-memory [`SettingsStore`] for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{SettingsUpdate, UserId, UserSettings};

use super::{apply_update, SettingsStore};

#[derive(Default)]
pub struct InMemorySettingsStore {
    users: RwLock<HashMap<UserId, UserSettings>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get_or_create(&self, user_id: UserId) -> Result<UserSettings> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        Ok(users
            .entry(user_id)
            .or_insert_with(|| UserSettings::defaults(user_id))
            .clone())
    }

    async fn update(&self, user_id: UserId, change: SettingsUpdate) -> Result<UserSettings> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let settings = users
            .entry(user_id)
            .or_insert_with(|| UserSettings::defaults(user_id));
        apply_update(settings, change);
        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LangCode, SortOrder};

    #[tokio::test]
    async fn test_first_access_creates_defaults() {
        let store = InMemorySettingsStore::new();
        let s = store.get_or_create(42).await.unwrap();
        assert_eq!(s, UserSettings::defaults(42));
    }

    #[tokio::test]
    async fn test_update_is_per_user() {
        let store = InMemorySettingsStore::new();
        store
            .update(1, SettingsUpdate::DateSortOrder(SortOrder::Asc))
            .await
            .unwrap();
        let updated = store
            .update(1, SettingsUpdate::Lang(LangCode::parse("en")))
            .await
            .unwrap();

        assert_eq!(updated.date_sort_order, SortOrder::Asc);
        assert_eq!(updated.lang.unwrap().as_str(), "en");
        assert_eq!(
            store.get_or_create(2).await.unwrap().date_sort_order,
            SortOrder::Desc
        );
    }
}

//! The facade the chat transport talks to.
//!
//! [`LibraryService`] ties the [`SearchEngine`], the [`SettingsStore`] and
//! the [`SessionStore`] together. The transport hands it message text,
//! parsed [`Action`]s or [`Nav`] requests and renders the typed [`Reply`]
//! it gets back; nothing here knows how replies look on screen.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::actions::{Action, SettingKey, SettingValue};
use crate::catalog::Catalog;
use crate::engine::{series_books_query, SearchEngine, SearchOptions};
use crate::error::{Error, Result};
use crate::models::{
    Book, BookFormat, LangCode, LanguageCount, SearchMode, SeriesEntry, SettingsUpdate, SizeLimit,
    SortOrder, UserId, UserSettings, DEFAULT_MAX_BOOKS,
};
use crate::pagination::{Cursor, Nav, PageSet, PageView};
use crate::session::{SearchSession, SessionStore, UserSession};
use crate::settings::SettingsStore;

/// Knobs the service takes from configuration.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Page sizes offered in the settings menu.
    pub max_books_options: Vec<u32>,
    /// Inactivity after which a session's results are swept.
    pub idle_timeout: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            max_books_options: vec![DEFAULT_MAX_BOOKS, DEFAULT_MAX_BOOKS * 2],
            idle_timeout: Duration::hours(1),
        }
    }
}

/// One choice in a setting's option list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingOption {
    /// Action that applies this choice.
    pub action: String,
    pub label: String,
    pub selected: bool,
}

/// The option list for one setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingMenu {
    pub key: String,
    pub title: String,
    pub options: Vec<SettingOption>,
}

/// One line of the top-level settings menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingSummary {
    pub key: String,
    pub title: String,
    pub current: String,
}

/// What the transport should show next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// A page of books; `series` is set when drilled down from a series.
    Books {
        view: PageView<Book>,
        series: Option<String>,
    },
    Series {
        view: PageView<SeriesEntry>,
    },
    NoResults {
        mode: SearchMode,
        series: Option<String>,
    },
    ParentGenres {
        genres: Vec<String>,
    },
    Genres {
        parent: String,
        genres: Vec<String>,
    },
    Languages {
        languages: Vec<LanguageCount>,
    },
    SettingsMenu {
        settings: Vec<SettingSummary>,
    },
    SettingOptions {
        menu: SettingMenu,
    },
    SettingApplied {
        menu: SettingMenu,
    },
    Blocked,
    /// Navigation arrived with no live result set.
    SessionExpired,
    /// A series button pointed outside the current result set.
    NotFound,
}

pub struct LibraryService<C: Catalog, S: SettingsStore> {
    engine: SearchEngine<C>,
    settings: S,
    sessions: Arc<dyn SessionStore>,
    options: ServiceOptions,
}

impl<C: Catalog, S: SettingsStore> LibraryService<C, S> {
    pub fn new(
        engine: SearchEngine<C>,
        settings: S,
        sessions: Arc<dyn SessionStore>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            engine,
            settings,
            sessions,
            options,
        }
    }

    pub fn engine(&self) -> &SearchEngine<C> {
        &self.engine
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.sessions)
    }

    pub fn idle_timeout(&self) -> Duration {
        self.options.idle_timeout
    }

    /// Clears the results of sessions idle longer than the configured
    /// timeout. Returns how many were cleared.
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        self.sessions.sweep(now - self.options.idle_timeout)
    }

    pub async fn user_settings(&self, user_id: UserId) -> Result<UserSettings> {
        self.settings
            .get_or_create(user_id)
            .await
            .map_err(|source| Error::SettingsFailed { user_id, source })
    }

    /// Runs a books or series search, per the session's search mode.
    pub async fn handle_text(&self, user_id: UserId, text: &str) -> Result<Reply> {
        let settings = self.user_settings(user_id).await?;
        if settings.is_blocked {
            tracing::info!(user_id, "blocked user attempted search");
            return Ok(Reply::Blocked);
        }

        let prefs = self.session(user_id).prefs;
        let opts = SearchOptions::for_user(&settings, &prefs);
        let page_size = settings.page_size();

        let mut results = None;
        let reply = match prefs.search_mode {
            SearchMode::Books => {
                let (books, count) = self.engine.search_books(text, &opts).await?;
                tracing::info!(user_id, query = text, count, "searched books");
                if books.is_empty() {
                    Reply::NoResults {
                        mode: SearchMode::Books,
                        series: None,
                    }
                } else {
                    let cursor = Cursor::new(PageSet::new(books, page_size, count));
                    let view = cursor.view();
                    results = Some(SearchSession::books(text, cursor));
                    Reply::Books { view, series: None }
                }
            }
            SearchMode::Series => {
                let (series, count) = self.engine.search_series(text, &opts).await?;
                tracing::info!(user_id, query = text, count, "searched series");
                if series.is_empty() {
                    Reply::NoResults {
                        mode: SearchMode::Series,
                        series: None,
                    }
                } else {
                    let cursor = Cursor::new(PageSet::new(series, page_size, count));
                    let view = cursor.view();
                    results = Some(SearchSession::series(text, cursor));
                    Reply::Series { view }
                }
            }
        };

        self.with_session(user_id, |session| {
            if results.is_some() {
                session.search = results;
            }
        });
        Ok(reply)
    }

    /// Dispatches a button press.
    pub async fn handle_action(&self, user_id: UserId, action: Action) -> Result<Reply> {
        let settings = self.user_settings(user_id).await?;
        if settings.is_blocked {
            return Ok(Reply::Blocked);
        }

        let reply = match action {
            Action::BooksPage(page) => {
                tracing::info!(user_id, page, "changed page of books");
                self.with_session(user_id, |session| Self::go_to_books(session, page))
                    .unwrap_or(Reply::SessionExpired)
            }
            Action::SeriesPage(page) => {
                tracing::info!(user_id, page, "changed page of series");
                self.with_session(user_id, |session| Self::go_to_series(session, page))
                    .unwrap_or(Reply::SessionExpired)
            }
            Action::ShowSeries { page, index } => {
                self.show_series_books(user_id, &settings, page, index)
                    .await?
            }
            Action::BackToSeries => self
                .with_session(user_id, |session| match session.search.as_mut() {
                    Some(search) if search.series.is_some() => {
                        search.books = None;
                        search.series_name = None;
                        Self::current_view(search)
                    }
                    _ => Reply::SessionExpired,
                })
                .unwrap_or(Reply::SessionExpired),
            Action::ShowGenres(None) => {
                tracing::info!(user_id, "listed parent genres");
                Reply::ParentGenres {
                    genres: self.engine.get_parent_genres().await?,
                }
            }
            Action::ShowGenres(Some(parent)) => {
                tracing::info!(user_id, parent = %parent, "listed genres");
                let genres = self.engine.get_child_genres(&parent).await?;
                Reply::Genres { parent, genres }
            }
            Action::ShowLanguages => Reply::Languages {
                languages: self.engine.get_languages().await?,
            },
            Action::SettingsMenu => Reply::SettingsMenu {
                settings: Self::summaries(&settings, &self.session(user_id)),
            },
            Action::OpenSetting(key) => Reply::SettingOptions {
                menu: self
                    .setting_menu(key, &settings, &self.session(user_id))
                    .await?,
            },
            Action::ApplySetting(value) => {
                let key = value.key();
                tracing::info!(user_id, setting = %key, value = %value.token(), "changed setting");
                let settings = self.apply_setting(user_id, value).await?;
                Reply::SettingApplied {
                    menu: self
                        .setting_menu(key, &settings, &self.session(user_id))
                        .await?,
                }
            }
        };

        self.with_session(user_id, |_| ());
        Ok(reply)
    }

    /// Moves within whatever result list is on screen. Out-of-range moves
    /// re-render the current page.
    pub async fn navigate(&self, user_id: UserId, nav: Nav) -> Result<Reply> {
        let settings = self.user_settings(user_id).await?;
        if settings.is_blocked {
            return Ok(Reply::Blocked);
        }

        let reply = self.with_session(user_id, |session| match session.search.as_mut() {
            Some(search) => {
                let moved = match (search.books.as_mut(), search.series.as_mut()) {
                    (Some(books), _) => books.navigate(nav),
                    (None, Some(series)) => series.navigate(nav),
                    (None, None) => false,
                };
                tracing::info!(user_id, ?nav, moved, "navigated");
                Self::current_view(search)
            }
            None => Reply::SessionExpired,
        });

        Ok(reply.unwrap_or(Reply::SessionExpired))
    }

    /// A copy of the user's session, for reading.
    fn session(&self, user_id: UserId) -> UserSession {
        self.sessions
            .get(user_id)
            .unwrap_or_else(|| UserSession::new(Utc::now()))
    }

    /// Applies `f` to the stored session in place and marks it active.
    /// `None` only if the store never ran `f`.
    fn with_session<R>(
        &self,
        user_id: UserId,
        f: impl FnOnce(&mut UserSession) -> R,
    ) -> Option<R> {
        let mut f = Some(f);
        let mut out = None;
        self.sessions.update(user_id, Utc::now(), &mut |session| {
            if let Some(f) = f.take() {
                out = Some(f(session));
            }
        });
        out
    }

    fn current_view(search: &SearchSession) -> Reply {
        match (&search.books, &search.series) {
            (Some(books), _) => Reply::Books {
                view: books.view(),
                series: search.series_name.clone(),
            },
            (None, Some(series)) => Reply::Series {
                view: series.view(),
            },
            (None, None) => Reply::SessionExpired,
        }
    }

    fn go_to_books(session: &mut UserSession, page: usize) -> Reply {
        let Some(search) = session.search.as_mut() else {
            return Reply::SessionExpired;
        };
        let Some(books) = search.books.as_mut() else {
            return Reply::SessionExpired;
        };
        books.go_to(page);
        Reply::Books {
            view: books.view(),
            series: search.series_name.clone(),
        }
    }

    fn go_to_series(session: &mut UserSession, page: usize) -> Reply {
        let Some(series) = session.search.as_mut().and_then(|s| s.series.as_mut()) else {
            return Reply::SessionExpired;
        };
        series.go_to(page);
        Reply::Series {
            view: series.view(),
        }
    }

    async fn show_series_books(
        &self,
        user_id: UserId,
        settings: &UserSettings,
        page: usize,
        index: usize,
    ) -> Result<Reply> {
        let session = self.session(user_id);
        let opts = SearchOptions::for_user(settings, &session.prefs);
        let Some(search) = session.search else {
            return Ok(Reply::SessionExpired);
        };
        let Some(series_cursor) = search.series.as_ref() else {
            return Ok(Reply::SessionExpired);
        };
        let Some(entry) = series_cursor
            .set()
            .page(page)
            .and_then(|p| p.get(index))
            .cloned()
        else {
            return Ok(Reply::NotFound);
        };

        let cursor = match series_books_query(&search.query, &entry.search_title) {
            Some(query) => {
                let (books, count) = self.engine.search_books(&query, &opts).await?;
                tracing::info!(user_id, series = %entry.title, count, "opened series");
                (!books.is_empty())
                    .then(|| Cursor::new(PageSet::new(books, settings.page_size(), count)))
            }
            None => {
                tracing::warn!(user_id, series = %entry.title, "series has no search title");
                None
            }
        };

        // The series list may have been replaced while the books were loading.
        let reply = self.with_session(user_id, |session| {
            let Some(live) = session.search.as_mut() else {
                return Reply::SessionExpired;
            };
            if live.query != search.query {
                return Reply::SessionExpired;
            }
            let Some(series) = live.series.as_mut() else {
                return Reply::SessionExpired;
            };
            series.go_to(page);
            match cursor {
                Some(cursor) => {
                    let view = cursor.view();
                    live.books = Some(cursor);
                    live.series_name = Some(entry.title.clone());
                    Reply::Books {
                        view,
                        series: Some(entry.title),
                    }
                }
                None => Reply::NoResults {
                    mode: SearchMode::Books,
                    series: Some(entry.title),
                },
            }
        });
        Ok(reply.unwrap_or(Reply::SessionExpired))
    }

    async fn apply_setting(&self, user_id: UserId, value: SettingValue) -> Result<UserSettings> {
        let change = match value {
            SettingValue::SizeLimit(limit) => {
                self.with_session(user_id, |session| session.prefs.size_limit = limit);
                return self.user_settings(user_id).await;
            }
            SettingValue::SearchType(mode) => {
                self.with_session(user_id, |session| session.prefs.search_mode = mode);
                return self.user_settings(user_id).await;
            }
            SettingValue::MaxBooks(n) => SettingsUpdate::MaxBooks(n),
            SettingValue::Lang(lang) => SettingsUpdate::Lang(lang),
            SettingValue::SortOrder(order) => SettingsUpdate::DateSortOrder(order),
            SettingValue::BookFormat(format) => SettingsUpdate::BookFormat(format),
        };
        self.settings
            .update(user_id, change)
            .await
            .map_err(|source| Error::SettingsFailed { user_id, source })
    }

    fn summaries(settings: &UserSettings, session: &UserSession) -> Vec<SettingSummary> {
        SettingKey::ALL
            .into_iter()
            .map(|key| SettingSummary {
                key: key.to_string(),
                title: key.title().to_string(),
                current: current_value(key, settings, session).token(),
            })
            .collect()
    }

    async fn setting_menu(
        &self,
        key: SettingKey,
        settings: &UserSettings,
        session: &UserSession,
    ) -> Result<SettingMenu> {
        let current = current_value(key, settings, session);
        let choices: Vec<(SettingValue, String)> = match key {
            SettingKey::MaxBooks => self
                .options
                .max_books_options
                .iter()
                .map(|n| (SettingValue::MaxBooks(*n), n.to_string()))
                .collect(),
            SettingKey::LangSearch => {
                let mut choices = Vec::new();
                if let SettingValue::Lang(Some(lang)) = &current {
                    choices.push((SettingValue::Lang(None), format!("{} - reset", lang)));
                }
                for l in self.engine.get_languages().await? {
                    if let Some(code) = LangCode::parse(&l.lang) {
                        let label = code.to_string();
                        choices.push((SettingValue::Lang(Some(code)), label));
                    }
                }
                choices
            }
            SettingKey::SortOrder => vec![
                (SettingValue::SortOrder(SortOrder::Asc), "Ascending".to_string()),
                (SettingValue::SortOrder(SortOrder::Desc), "Descending".to_string()),
            ],
            SettingKey::SizeLimit => vec![
                (
                    SettingValue::SizeLimit(Some(SizeLimit::Smaller)),
                    "Up to 800 KB".to_string(),
                ),
                (
                    SettingValue::SizeLimit(Some(SizeLimit::Larger)),
                    "Over 800 KB".to_string(),
                ),
                (SettingValue::SizeLimit(None), "No limit".to_string()),
            ],
            SettingKey::BookFormat => [BookFormat::Fb2, BookFormat::Mobi, BookFormat::Epub]
                .into_iter()
                .map(|f| (SettingValue::BookFormat(f), f.to_string().to_uppercase()))
                .collect(),
            SettingKey::SearchType => vec![
                (SettingValue::SearchType(SearchMode::Books), "Books".to_string()),
                (SettingValue::SearchType(SearchMode::Series), "Series".to_string()),
            ],
        };

        let options = choices
            .into_iter()
            .map(|(value, label)| SettingOption {
                selected: value == current,
                action: Action::ApplySetting(value).to_string(),
                label,
            })
            .collect();

        Ok(SettingMenu {
            key: key.to_string(),
            title: key.title().to_string(),
            options,
        })
    }
}

fn current_value(key: SettingKey, settings: &UserSettings, session: &UserSession) -> SettingValue {
    match key {
        SettingKey::MaxBooks => SettingValue::MaxBooks(settings.max_books),
        SettingKey::LangSearch => SettingValue::Lang(settings.lang.clone()),
        SettingKey::SortOrder => SettingValue::SortOrder(settings.date_sort_order),
        SettingKey::SizeLimit => SettingValue::SizeLimit(session.prefs.size_limit),
        SettingKey::BookFormat => SettingValue::BookFormat(settings.book_format),
        SettingKey::SearchType => SettingValue::SearchType(session.prefs.search_mode),
    }
}

//! Callback-string protocol between the chat transport and the service.
//!
//! Buttons carry short strings such as `page_2`, `show_series:0:3` or
//! `set_sort_order_to_asc`. They are parsed once into an [`Action`] and
//! dispatched with a `match`; [`Display`](fmt::Display) produces the same
//! strings for building buttons.

use std::fmt;
use std::str::FromStr;

use crate::models::{BookFormat, LangCode, SearchMode, SizeLimit, SortOrder, MAX_BOOKS_LIMIT};

/// A user-adjustable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    MaxBooks,
    LangSearch,
    SortOrder,
    SizeLimit,
    BookFormat,
    SearchType,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::MaxBooks,
        SettingKey::LangSearch,
        SettingKey::SortOrder,
        SettingKey::SizeLimit,
        SettingKey::BookFormat,
        SettingKey::SearchType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::MaxBooks => "max_books",
            SettingKey::LangSearch => "lang_search",
            SettingKey::SortOrder => "sort_order",
            SettingKey::SizeLimit => "size_limit",
            SettingKey::BookFormat => "book_format",
            SettingKey::SearchType => "search_type",
        }
    }

    /// Menu title.
    pub fn title(&self) -> &'static str {
        match self {
            SettingKey::MaxBooks => "Results per page",
            SettingKey::LangSearch => "Book language",
            SettingKey::SortOrder => "Sort by publication date",
            SettingKey::SizeLimit => "Book size limit",
            SettingKey::BookFormat => "Download format",
            SettingKey::SearchType => "Search type",
        }
    }

    /// True for settings that live only as long as the session.
    pub fn is_session_only(&self) -> bool {
        matches!(self, SettingKey::SizeLimit | SettingKey::SearchType)
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown setting: '{}'", s))
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A new value for one [`SettingKey`]. `None` values clear the setting.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    MaxBooks(u32),
    Lang(Option<LangCode>),
    SortOrder(SortOrder),
    SizeLimit(Option<SizeLimit>),
    BookFormat(BookFormat),
    SearchType(SearchMode),
}

impl SettingValue {
    pub fn key(&self) -> SettingKey {
        match self {
            SettingValue::MaxBooks(_) => SettingKey::MaxBooks,
            SettingValue::Lang(_) => SettingKey::LangSearch,
            SettingValue::SortOrder(_) => SettingKey::SortOrder,
            SettingValue::SizeLimit(_) => SettingKey::SizeLimit,
            SettingValue::BookFormat(_) => SettingKey::BookFormat,
            SettingValue::SearchType(_) => SettingKey::SearchType,
        }
    }

    /// Parses the wire token for `key`. An empty token clears the
    /// language and size settings.
    pub fn parse(key: SettingKey, raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        match key {
            SettingKey::MaxBooks => {
                let n: u32 = raw
                    .parse()
                    .map_err(|_| format!("invalid page size: '{}'", raw))?;
                if n == 0 || n > MAX_BOOKS_LIMIT {
                    return Err(format!("page size must be 1..={}", MAX_BOOKS_LIMIT));
                }
                Ok(SettingValue::MaxBooks(n))
            }
            SettingKey::LangSearch if raw.is_empty() => Ok(SettingValue::Lang(None)),
            SettingKey::LangSearch => LangCode::parse(raw)
                .map(|l| SettingValue::Lang(Some(l)))
                .ok_or_else(|| format!("invalid language code: '{}'", raw)),
            SettingKey::SortOrder => raw.parse().map(SettingValue::SortOrder),
            SettingKey::SizeLimit if raw.is_empty() => Ok(SettingValue::SizeLimit(None)),
            SettingKey::SizeLimit => raw.parse().map(|s| SettingValue::SizeLimit(Some(s))),
            SettingKey::BookFormat => raw.parse().map(SettingValue::BookFormat),
            SettingKey::SearchType => raw.parse().map(SettingValue::SearchType),
        }
    }

    /// Wire token; the inverse of [`SettingValue::parse`].
    pub fn token(&self) -> String {
        match self {
            SettingValue::MaxBooks(n) => n.to_string(),
            SettingValue::Lang(lang) => lang.as_ref().map(|l| l.to_string()).unwrap_or_default(),
            SettingValue::SortOrder(o) => o.to_string(),
            SettingValue::SizeLimit(s) => s.map(|s| s.to_string()).unwrap_or_default(),
            SettingValue::BookFormat(b) => b.to_string(),
            SettingValue::SearchType(m) => m.to_string(),
        }
    }
}

/// Everything a button can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `page_<n>`
    BooksPage(usize),
    /// `series_page_<n>`
    SeriesPage(usize),
    /// `show_series:<page>:<index>`, index within that page.
    ShowSeries { page: usize, index: usize },
    /// `back_to_series`
    BackToSeries,
    /// `show_genres` for the top level, `show_genres:<parent>` below it.
    ShowGenres(Option<String>),
    /// `show_langs`
    ShowLanguages,
    /// `back_to_settings`
    SettingsMenu,
    /// `set_<key>`
    OpenSetting(SettingKey),
    /// `set_<key>_to_<value>`
    ApplySetting(SettingValue),
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || format!("unknown action: '{}'", s);

        if let Some(n) = s.strip_prefix("series_page_") {
            return n.parse().map(Action::SeriesPage).map_err(|_| unknown());
        }
        if let Some(n) = s.strip_prefix("page_") {
            return n.parse().map(Action::BooksPage).map_err(|_| unknown());
        }
        if let Some(rest) = s.strip_prefix("show_series:") {
            let (page, index) = rest.split_once(':').ok_or_else(unknown)?;
            return Ok(Action::ShowSeries {
                page: page.parse().map_err(|_| unknown())?,
                index: index.parse().map_err(|_| unknown())?,
            });
        }
        if let Some(parent) = s.strip_prefix("show_genres:") {
            return Ok(Action::ShowGenres(Some(parent.to_string())));
        }
        match s {
            "show_genres" => return Ok(Action::ShowGenres(None)),
            "show_langs" => return Ok(Action::ShowLanguages),
            "back_to_series" => return Ok(Action::BackToSeries),
            "back_to_settings" => return Ok(Action::SettingsMenu),
            _ => {}
        }
        if let Some(rest) = s.strip_prefix("set_") {
            for key in SettingKey::ALL {
                let Some(tail) = rest.strip_prefix(key.as_str()) else {
                    continue;
                };
                if tail.is_empty() {
                    return Ok(Action::OpenSetting(key));
                }
                if let Some(value) = tail.strip_prefix("_to_") {
                    return SettingValue::parse(key, value).map(Action::ApplySetting);
                }
            }
        }
        Err(unknown())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::BooksPage(n) => write!(f, "page_{}", n),
            Action::SeriesPage(n) => write!(f, "series_page_{}", n),
            Action::ShowSeries { page, index } => write!(f, "show_series:{}:{}", page, index),
            Action::BackToSeries => f.write_str("back_to_series"),
            Action::ShowGenres(None) => f.write_str("show_genres"),
            Action::ShowGenres(Some(parent)) => write!(f, "show_genres:{}", parent),
            Action::ShowLanguages => f.write_str("show_langs"),
            Action::SettingsMenu => f.write_str("back_to_settings"),
            Action::OpenSetting(key) => write!(f, "set_{}", key),
            Action::ApplySetting(value) => write!(f, "set_{}_to_{}", value.key(), value.token()),
        }
    }
}

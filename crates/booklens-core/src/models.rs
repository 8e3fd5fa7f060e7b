//! Core data models shared by the query pipeline, the catalog backends and
//! the session layer.
//!
//! [`Book`] and [`SeriesEntry`] are read-only projections of the external
//! catalog. [`UserSettings`] is the per-user preference record read on every
//! search. The small enums ([`SortOrder`], [`SizeLimit`], [`BookFormat`],
//! [`SearchMode`]) and [`LangCode`] are closed vocabularies: they are the only
//! values ever interpolated into SQL text, everything user-typed is bound.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

/// Chat-platform user identifier.
pub type UserId = i64;

/// Default page size (`UserSettings.MaxBooks`).
pub const DEFAULT_MAX_BOOKS: u32 = 20;

/// Upper bound accepted for a page size setting.
pub const MAX_BOOKS_LIMIT: u32 = 100;

/// One logical book, collapsed from the catalog's join fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub file_name: String,
    pub title: String,
    pub search_title: Option<String>,
    pub search_lang: Option<String>,
    pub author: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub genre: Option<String>,
    pub genre_parent: Option<String>,
    pub folder: Option<String>,
    pub ext: Option<String>,
    /// Size in bytes.
    pub book_size: i64,
    /// Publication year, `0` when unknown.
    pub search_year: i64,
    pub update_date: Option<String>,
}

impl Book {
    /// Column order shared by the SELECT builder and the row mapper.
    ///
    /// The first entry is the grouping key; every other column is
    /// aggregated with `MAX`.
    pub const COLUMNS: [&'static str; 15] = [
        "FileName",
        "Title",
        "SearchTitle",
        "SearchLang",
        "Author",
        "LastName",
        "FirstName",
        "MiddleName",
        "Genre",
        "GenreParent",
        "Folder",
        "Ext",
        "BookSize",
        "SearchYear",
        "UpdateDate",
    ];

    /// Grouping key: uniquely identifies a book in the catalog.
    pub const KEY_COLUMN: &'static str = "FileName";

    /// Recency column used for ordering.
    pub const ORDER_COLUMN: &'static str = "UpdateDate";

    /// Display name "Last First", skipping missing parts.
    pub fn author_display(&self) -> String {
        [self.last_name.as_deref(), self.first_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A series aggregated from the books matching a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesEntry {
    pub title: String,
    /// Normalized (upper-cased) title, used for exact drill-down matching.
    pub search_title: String,
    pub book_count: i64,
}

/// A catalog language and the number of books in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageCount {
    pub lang: String,
    pub count: i64,
}

/// Result ordering by the catalog's update date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: '{}'", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Coarse book-size bucket, precomputed by the catalog view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeLimit {
    /// 800 KiB or less.
    Smaller,
    /// Over 800 KiB.
    Larger,
}

impl SizeLimit {
    /// Bucket token as produced by the view's `BookSizeCat` column.
    pub fn as_token(&self) -> &'static str {
        match self {
            SizeLimit::Smaller => "less800",
            SizeLimit::Larger => "more800",
        }
    }
}

impl FromStr for SizeLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "less800" => Ok(SizeLimit::Smaller),
            "more800" => Ok(SizeLimit::Larger),
            other => Err(format!("unknown size limit: '{}'", other)),
        }
    }
}

impl fmt::Display for SizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Download format preference. Delivery itself happens outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BookFormat {
    #[default]
    Fb2,
    Mobi,
    Epub,
}

impl FromStr for BookFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fb2" => Ok(BookFormat::Fb2),
            "mobi" => Ok(BookFormat::Mobi),
            "epub" => Ok(BookFormat::Epub),
            other => Err(format!("unknown book format: '{}'", other)),
        }
    }
}

impl fmt::Display for BookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookFormat::Fb2 => f.write_str("fb2"),
            BookFormat::Mobi => f.write_str("mobi"),
            BookFormat::Epub => f.write_str("epub"),
        }
    }
}

/// What a plain text message searches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SearchMode {
    #[default]
    Books,
    Series,
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "books" => Ok(SearchMode::Books),
            "series" => Ok(SearchMode::Series),
            other => Err(format!("unknown search type: '{}'", other)),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Books => f.write_str("books"),
            SearchMode::Series => f.write_str("series"),
        }
    }
}

/// Two-letter ISO language code.
///
/// Only values that pass [`LangCode::parse`] may be interpolated into a
/// WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LangCode(String);

impl LangCode {
    /// Accepts exactly two ASCII letters, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Self(s.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased form matching the catalog's `SearchLang` column.
    pub fn to_search_form(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistent per-user preferences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSettings {
    pub user_id: UserId,
    /// Page size.
    pub max_books: u32,
    pub lang: Option<LangCode>,
    pub date_sort_order: SortOrder,
    pub book_format: BookFormat,
    pub last_news_date: NaiveDate,
    pub is_blocked: bool,
}

impl UserSettings {
    /// The record created on first access.
    pub fn defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            max_books: DEFAULT_MAX_BOOKS,
            lang: None,
            date_sort_order: SortOrder::Desc,
            book_format: BookFormat::Fb2,
            last_news_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN),
            is_blocked: false,
        }
    }

    /// Page size clamped to a usable value.
    pub fn page_size(&self) -> usize {
        self.max_books.clamp(1, MAX_BOOKS_LIMIT) as usize
    }
}

/// A single typed change to a persisted setting.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsUpdate {
    MaxBooks(u32),
    Lang(Option<LangCode>),
    DateSortOrder(SortOrder),
    BookFormat(BookFormat),
    LastNewsDate(NaiveDate),
    Blocked(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_code_accepts_two_letters() {
        assert_eq!(LangCode::parse("RU").unwrap().as_str(), "ru");
        assert_eq!(LangCode::parse(" en ").unwrap().to_search_form(), "EN");
    }

    #[test]
    fn test_lang_code_rejects_injection() {
        assert!(LangCode::parse("").is_none());
        assert!(LangCode::parse("rus").is_none());
        assert!(LangCode::parse("r'").is_none());
        assert!(LangCode::parse("ру").is_none());
    }

    #[test]
    fn test_enum_tokens() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!("asc".parse::<SortOrder>().unwrap().as_sql(), "ASC");
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!("less800".parse::<SizeLimit>().unwrap(), SizeLimit::Smaller);
        assert_eq!(SizeLimit::Larger.to_string(), "more800");
        assert_eq!("EPUB".parse::<BookFormat>().unwrap(), BookFormat::Epub);
        assert_eq!("series".parse::<SearchMode>().unwrap(), SearchMode::Series);
    }

    #[test]
    fn test_defaults() {
        let s = UserSettings::defaults(7);
        assert_eq!(s.max_books, 20);
        assert_eq!(s.date_sort_order, SortOrder::Desc);
        assert_eq!(s.book_format, BookFormat::Fb2);
        assert_eq!(s.last_news_date.to_string(), "2000-01-01");
        assert!(!s.is_blocked);
        assert!(s.lang.is_none());
    }

    #[test]
    fn test_page_size_clamped() {
        let mut s = UserSettings::defaults(1);
        s.max_books = 0;
        assert_eq!(s.page_size(), 1);
        s.max_books = 10_000;
        assert_eq!(s.page_size(), MAX_BOOKS_LIMIT as usize);
    }

    #[test]
    fn test_columns_key_first() {
        assert_eq!(Book::COLUMNS[0], Book::KEY_COLUMN);
        assert!(Book::COLUMNS.contains(&Book::ORDER_COLUMN));
    }
}

//! Search orchestration over a [`Catalog`].
//!
//! # Pipeline
//!
//! 1. [`parse_query`] the text. Criteria found: build the predicate from
//!    them; none found: tokenize into words and build from those.
//! 2. Closed predicate (nothing usable survived): return `(empty, 0)`
//!    without touching the catalog.
//! 3. Otherwise run the list query and the count query with the same
//!    predicate. Neither is limited; paging happens in [`crate::pagination`].
//!
//! Genre and language lists are reference data: they are read once per key
//! and cached for the life of the engine. Two concurrent first reads may
//! both hit the catalog; the second write wins with an identical value.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::catalog::Catalog;
use crate::criteria::{parse_query, split_words};
use crate::error::{Error, Result};
use crate::models::{Book, LangCode, LanguageCount, SeriesEntry, SizeLimit, SortOrder, UserSettings};
use crate::predicate::{build_for_criteria, build_for_words, Filters, Predicate};
use crate::session::SessionPrefs;

/// Per-search parameters, normally assembled from the user's settings and
/// session preferences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Page size the caller will paginate with.
    pub max_books: u32,
    pub lang: Option<LangCode>,
    pub sort_order: SortOrder,
    pub size_limit: Option<SizeLimit>,
}

impl SearchOptions {
    pub fn for_user(settings: &UserSettings, prefs: &SessionPrefs) -> Self {
        Self {
            max_books: settings.max_books,
            lang: settings.lang.clone(),
            sort_order: settings.date_sort_order,
            size_limit: prefs.size_limit,
        }
    }

    pub fn filters(&self) -> Filters {
        Filters {
            lang: self.lang.clone(),
            size_limit: self.size_limit,
        }
    }
}

/// Translates query text into a predicate: criteria syntax when present,
/// whole-word matching otherwise.
pub fn build_predicate(query: &str, filters: &Filters) -> Predicate {
    let criteria = parse_query(query);
    if criteria.is_empty() {
        build_for_words(&split_words(query), filters)
    } else {
        build_for_criteria(&criteria, filters)
    }
}

/// Query text for the books of one series found by `series_query`.
///
/// The exact-series criterion is appended to the original query so its
/// other filters still apply. `None` when the series has no searchable
/// title, since an empty criterion would match outside the series.
pub fn series_books_query(series_query: &str, series_search_title: &str) -> Option<String> {
    let title = series_search_title.trim();
    if title.is_empty() {
        return None;
    }
    let quote = if title.contains('\'') && !title.contains('"') {
        "\""
    } else {
        "'"
    };
    let escaped = title.replace(quote, &quote.repeat(2));
    let series = format!("серия: {q}{}{q}", escaped, q = quote);
    let base = series_query.trim();
    if base.is_empty() {
        Some(series)
    } else {
        Some(format!("{}, {}", base, series))
    }
}

pub struct SearchEngine<C: Catalog> {
    catalog: C,
    parent_genres: RwLock<Option<Vec<String>>>,
    child_genres: RwLock<HashMap<String, Vec<String>>>,
    languages: RwLock<Option<Vec<LanguageCount>>>,
}

impl<C: Catalog> SearchEngine<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            parent_genres: RwLock::new(None),
            child_genres: RwLock::new(HashMap::new()),
            languages: RwLock::new(None),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Books matching `query`, one per file name, in update-date order,
    /// plus the number of distinct matching books.
    pub async fn search_books(&self, query: &str, opts: &SearchOptions) -> Result<(Vec<Book>, i64)> {
        let predicate = build_predicate(query, &opts.filters());
        if predicate.is_closed() {
            tracing::debug!(query, "query produced no usable condition");
            return Ok((Vec::new(), 0));
        }

        let books = self
            .catalog
            .query_books(&predicate, opts.sort_order)
            .await
            .map_err(Error::SearchFailed)?;
        let count = self
            .catalog
            .count_books(&predicate)
            .await
            .map_err(Error::SearchFailed)?;
        Ok((books, count))
    }

    /// Series of the books matching `query`, most populated first, plus the
    /// number of series.
    pub async fn search_series(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<(Vec<SeriesEntry>, i64)> {
        let predicate = build_predicate(query, &opts.filters());
        if predicate.is_closed() {
            tracing::debug!(query, "series query produced no usable condition");
            return Ok((Vec::new(), 0));
        }

        let series = self
            .catalog
            .query_series(&predicate)
            .await
            .map_err(Error::SearchFailed)?;
        let count = self
            .catalog
            .count_series(&predicate)
            .await
            .map_err(Error::SearchFailed)?;
        Ok((series, count))
    }

    pub async fn get_parent_genres(&self) -> Result<Vec<String>> {
        if let Some(cached) = read(&self.parent_genres).as_ref() {
            return Ok(cached.clone());
        }
        let genres = self
            .catalog
            .parent_genres()
            .await
            .map_err(Error::SearchFailed)?;
        *write(&self.parent_genres) = Some(genres.clone());
        Ok(genres)
    }

    pub async fn get_child_genres(&self, parent: &str) -> Result<Vec<String>> {
        if let Some(cached) = read(&self.child_genres).get(parent) {
            return Ok(cached.clone());
        }
        let genres = self
            .catalog
            .child_genres(parent)
            .await
            .map_err(Error::SearchFailed)?;
        write(&self.child_genres).insert(parent.to_string(), genres.clone());
        Ok(genres)
    }

    pub async fn get_languages(&self) -> Result<Vec<LanguageCount>> {
        if let Some(cached) = read(&self.languages).as_ref() {
            return Ok(cached.clone());
        }
        let langs = self.catalog.languages().await.map_err(Error::SearchFailed)?;
        *write(&self.languages) = Some(langs.clone());
        Ok(langs)
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::SqlParam;
    use crate::testing::{book, series, FixtureCatalog};

    fn opts() -> SearchOptions {
        SearchOptions {
            max_books: 20,
            ..SearchOptions::default()
        }
    }

    #[tokio::test]
    async fn test_short_tokens_never_reach_catalog() {
        let engine = SearchEngine::new(FixtureCatalog::with_books(vec![book("1", "x")]));
        let (books, count) = engine.search_books("a b c", &opts()).await.unwrap();
        assert!(books.is_empty());
        assert_eq!(count, 0);

        let (books, count) = engine.search_books("   ", &opts()).await.unwrap();
        assert!(books.is_empty());
        assert_eq!(count, 0);
        assert_eq!(engine.catalog().calls(), 0);
    }

    #[tokio::test]
    async fn test_books_and_count_use_same_predicate() {
        let engine = SearchEngine::new(FixtureCatalog::with_books(vec![
            book("1", "Война и мир"),
            book("2", "Анна Каренина"),
        ]));
        let (books, count) = engine.search_books("Толстой", &opts()).await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(count, 2);

        let seen = engine.catalog().predicates();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0].condition(), "FullSearch LIKE ?");
    }

    #[tokio::test]
    async fn test_criteria_take_precedence_over_words() {
        let engine = SearchEngine::new(FixtureCatalog::default());
        engine.search_books("автор: Толстой", &opts()).await.unwrap();
        assert_eq!(engine.catalog().predicates()[0].condition(), "Author LIKE ?");
    }

    #[tokio::test]
    async fn test_filters_reach_predicate() {
        let engine = SearchEngine::new(FixtureCatalog::default());
        let opts = SearchOptions {
            lang: LangCode::parse("ru"),
            size_limit: Some(SizeLimit::Smaller),
            ..opts()
        };
        engine.search_series("Дозор", &opts).await.unwrap();
        assert_eq!(
            engine.catalog().predicates()[0].condition(),
            "FullSearch LIKE ? AND SearchLang LIKE 'RU' AND BookSizeCat = 'less800'"
        );
    }

    #[tokio::test]
    async fn test_series_search_returns_catalog_order() {
        let catalog = FixtureCatalog::with_series(vec![series("Дозоры", 6), series("Лабиринт", 3)]);
        let engine = SearchEngine::new(catalog);
        let (found, count) = engine.search_series("Лукьяненко", &opts()).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(found[0].title, "Дозоры");
    }

    #[tokio::test]
    async fn test_storage_failure_is_search_failed() {
        let engine = SearchEngine::new(FixtureCatalog::failing());
        let err = engine.search_books("Толстой", &opts()).await.unwrap_err();
        assert!(matches!(err, Error::SearchFailed(_)));
    }

    #[tokio::test]
    async fn test_reference_lists_cached() {
        let engine = SearchEngine::new(FixtureCatalog::default());
        let first = engine.get_parent_genres().await.unwrap();
        let again = engine.get_parent_genres().await.unwrap();
        assert_eq!(first, again);
        engine.get_child_genres("Фантастика").await.unwrap();
        engine.get_child_genres("Фантастика").await.unwrap();
        engine.get_languages().await.unwrap();
        engine.get_languages().await.unwrap();
        assert_eq!(engine.catalog().calls(), 3);
    }

    #[test]
    fn test_series_books_query() {
        assert_eq!(
            series_books_query("Лукьяненко", "ДОЗОРЫ").as_deref(),
            Some("Лукьяненко, серия: 'ДОЗОРЫ'")
        );
        assert_eq!(
            series_books_query("", "ДОЗОРЫ").as_deref(),
            Some("серия: 'ДОЗОРЫ'")
        );
        assert_eq!(
            series_books_query("x", "ЗАПИСКИ Д'АРТАНЬЯНА").as_deref(),
            Some("x, серия: \"ЗАПИСКИ Д'АРТАНЬЯНА\"")
        );
    }

    #[test]
    fn test_series_books_query_parses_to_exact_series() {
        let query = series_books_query("автор: Лукьяненко", "ДОЗОРЫ").unwrap();
        let p = build_predicate(&query, &Filters::default());
        assert_eq!(p.condition(), "Author LIKE ? AND SearchSeriesTitle = ?");
    }

    #[test]
    fn test_series_title_with_both_quotes_stays_exact() {
        let title = r#"ХРОНИКИ "ТЬМЫ" O'НИЛА"#;
        let query = series_books_query("автор: О'Нил", title).unwrap();
        assert_eq!(query, r#"автор: О'Нил, серия: 'ХРОНИКИ "ТЬМЫ" O''НИЛА'"#);

        let p = build_predicate(&query, &Filters::default());
        assert_eq!(p.condition(), "Author LIKE ? AND SearchSeriesTitle = ?");
        assert_eq!(p.params()[1], SqlParam::Text(title.to_string()));
    }

    #[test]
    fn test_series_without_search_title_has_no_query() {
        assert_eq!(series_books_query("Лукьяненко", ""), None);
        assert_eq!(series_books_query("", "   "), None);
    }
}

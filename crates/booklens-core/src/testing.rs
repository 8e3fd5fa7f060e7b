//! Canned [`Catalog`] for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::catalog::Catalog;
use crate::models::{Book, LanguageCount, SeriesEntry, SortOrder};
use crate::predicate::Predicate;

/// Returns fixed rows regardless of the predicate and records what it was
/// asked.
#[derive(Default)]
pub struct FixtureCatalog {
    books: Vec<Book>,
    series: Vec<SeriesEntry>,
    fail: bool,
    calls: AtomicUsize,
    predicates: Mutex<Vec<Predicate>>,
}

impl FixtureCatalog {
    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books,
            ..Self::default()
        }
    }

    pub fn with_series(series: Vec<SeriesEntry>) -> Self {
        Self {
            series,
            ..Self::default()
        }
    }

    pub fn with_both(books: Vec<Book>, series: Vec<SeriesEntry>) -> Self {
        Self {
            books,
            series,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        self.predicates.lock().unwrap().clone()
    }

    fn record(&self, predicate: Option<&Predicate>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(p) = predicate {
            self.predicates.lock().unwrap().push(p.clone());
        }
        if self.fail {
            bail!("catalog offline");
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for FixtureCatalog {
    async fn query_books(&self, predicate: &Predicate, _order: SortOrder) -> Result<Vec<Book>> {
        self.record(Some(predicate))?;
        Ok(self.books.clone())
    }

    async fn count_books(&self, predicate: &Predicate) -> Result<i64> {
        self.record(Some(predicate))?;
        Ok(self.books.len() as i64)
    }

    async fn query_series(&self, predicate: &Predicate) -> Result<Vec<SeriesEntry>> {
        self.record(Some(predicate))?;
        Ok(self.series.clone())
    }

    async fn count_series(&self, predicate: &Predicate) -> Result<i64> {
        self.record(Some(predicate))?;
        Ok(self.series.len() as i64)
    }

    async fn parent_genres(&self) -> Result<Vec<String>> {
        self.record(None)?;
        Ok(vec!["Детективы".to_string(), "Фантастика".to_string()])
    }

    async fn child_genres(&self, parent: &str) -> Result<Vec<String>> {
        self.record(None)?;
        Ok(vec![format!("{}: разное", parent)])
    }

    async fn languages(&self) -> Result<Vec<LanguageCount>> {
        self.record(None)?;
        Ok(vec![
            LanguageCount {
                lang: "ru".to_string(),
                count: 10,
            },
            LanguageCount {
                lang: "en".to_string(),
                count: 3,
            },
        ])
    }
}

pub fn book(file_name: &str, title: &str) -> Book {
    Book {
        file_name: file_name.to_string(),
        title: title.to_string(),
        search_title: Some(title.to_uppercase()),
        search_lang: Some("RU".to_string()),
        author: None,
        last_name: None,
        first_name: None,
        middle_name: None,
        genre: None,
        genre_parent: None,
        folder: None,
        ext: Some(".fb2".to_string()),
        book_size: 0,
        search_year: 0,
        update_date: None,
    }
}

pub fn numbered_books(n: usize) -> Vec<Book> {
    (1..=n)
        .map(|i| book(&i.to_string(), &format!("Книга {}", i)))
        .collect()
}

pub fn series(title: &str, book_count: i64) -> SeriesEntry {
    SeriesEntry {
        title: title.to_string(),
        search_title: title.to_uppercase(),
        book_count,
    }
}

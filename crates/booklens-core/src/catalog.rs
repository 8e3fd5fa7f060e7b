//! Read-only access to the external book catalog.
//!
//! The [`Catalog`] trait is everything the [`SearchEngine`](crate::engine::SearchEngine)
//! needs from storage. Implementations run a [`Predicate`] against the
//! denormalized book view, binding its parameters in order; they never
//! build SQL from anything else the user typed.
//!
//! Implementations must be `Send + Sync`: one catalog is shared by every
//! concurrent request.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Book, LanguageCount, SeriesEntry, SortOrder};
use crate::predicate::Predicate;

/// Abstract catalog backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`query_books`](Catalog::query_books) | One [`Book`] per file name, ordered by update date |
/// | [`count_books`](Catalog::count_books) | Number of distinct books matching |
/// | [`query_series`](Catalog::query_series) | Series of matching books with per-series counts |
/// | [`count_series`](Catalog::count_series) | Number of such series |
/// | [`parent_genres`](Catalog::parent_genres) | Top-level genre names |
/// | [`child_genres`](Catalog::child_genres) | Genres under a parent |
/// | [`languages`](Catalog::languages) | Languages by book count |
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Matching books collapsed to one row per `FileName`, every other
    /// column taken as its group maximum. Not limited.
    async fn query_books(&self, predicate: &Predicate, order: SortOrder) -> Result<Vec<Book>>;

    async fn count_books(&self, predicate: &Predicate) -> Result<i64>;

    /// Series of the matching books, by book count descending then title.
    async fn query_series(&self, predicate: &Predicate) -> Result<Vec<SeriesEntry>>;

    async fn count_series(&self, predicate: &Predicate) -> Result<i64>;

    async fn parent_genres(&self) -> Result<Vec<String>>;

    async fn child_genres(&self, parent: &str) -> Result<Vec<String>>;

    /// Languages ordered by frequency, most common first.
    async fn languages(&self) -> Result<Vec<LanguageCount>>;
}

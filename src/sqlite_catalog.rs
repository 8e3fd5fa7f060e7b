//! SQLite-backed [`Catalog`].
//!
//! Every search runs against one denormalized view of the catalog
//! ([`book_view_sql`]): a book joined with its authors, series, genres and
//! metadata. A book with two authors and three genres yields six rows, so
//! book queries group by `FileName` and take `MAX` of every other column.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Row, SqlitePool};

use booklens_core::catalog::Catalog;
use booklens_core::models::{Book, LanguageCount, SeriesEntry, SortOrder};
use booklens_core::predicate::{Predicate, SqlParam};

use crate::db::CATALOG_COLLATION;
use crate::sqlite_functions::STRIP_PUNCTUATION;

/// The denormalized book view every search runs against.
pub fn book_view_sql() -> String {
    let full_search = format!(
        "{STRIP_PUNCTUATION}(' ' || coalesce(Books.SearchTitle, '') || ' ' || coalesce(Authors.SearchName, '') || ' ' \
         || coalesce(Series.SearchSeriesTitle, '') || ' ' || coalesce(Genres.SearchGenre, '') || ' ' \
         || coalesce(Books.SearchLang, '') || ' ')",
    );
    format!(
        r#"
        SELECT
            Books.Title,
            Books.SearchLang,
            Books.BookSize,
            CASE
                WHEN Books.BookSize <= 800 * 1024 THEN 'less800'
                ELSE 'more800'
            END AS BookSizeCat,
            Books.Folder,
            Books.FileName,
            Books.Ext,
            Books.SearchTitle,
            Books.UpdateDate,
            Books.LibRate,
            Authors.SearchName AS Author,
            Authors.LastName,
            Authors.FirstName,
            Authors.MiddleName,
            Series.SeriesTitle,
            Series.SearchSeriesTitle,
            Genres.GenreAlias AS Genre,
            Genres.SearchGenre AS GenreUpper,
            GenresParent.GenreAlias AS GenreParent,
            Books_Meta.SearchYear,
            Books_Meta.SearchCity,
            Books_Meta.SearchPublisher,
            {full_search} AS FullSearch
        FROM Books
        LEFT JOIN Author_List ON Author_List.BookID = Books.BookID
        INNER JOIN Authors ON Author_List.AuthorID = Authors.AuthorID
        LEFT JOIN Series ON Series.SeriesID = Books.SeriesID
        LEFT JOIN Genre_List ON Genre_List.BookID = Books.BookID
        INNER JOIN SearchGenres AS Genres ON Genres.GenreCode = Genre_List.GenreCode
        LEFT JOIN SearchGenres AS GenresParent ON GenresParent.GenreCode = Genres.ParentCode
        INNER JOIN Books_Meta ON Books_Meta.BookID = Books.BookID
        "#
    )
}

/// `FileName` plus `MAX` of every other [`Book::COLUMNS`] entry.
fn grouped_select_list() -> String {
    Book::COLUMNS
        .iter()
        .map(|col| {
            if *col == Book::KEY_COLUMN {
                col.to_string()
            } else {
                format!("MAX({col}) AS {col}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn books_query_sql(predicate: &Predicate, order: SortOrder) -> String {
    format!(
        "SELECT {} FROM ({} {}) GROUP BY {} ORDER BY {} {}, {}",
        grouped_select_list(),
        book_view_sql(),
        predicate.where_clause(),
        Book::KEY_COLUMN,
        Book::ORDER_COLUMN,
        order.as_sql(),
        Book::KEY_COLUMN,
    )
}

pub fn books_count_sql(predicate: &Predicate) -> String {
    format!(
        "SELECT COUNT(*) FROM (SELECT {key} FROM ({} {}) GROUP BY {key})",
        book_view_sql(),
        predicate.where_clause(),
        key = Book::KEY_COLUMN,
    )
}

pub fn series_query_sql(predicate: &Predicate) -> String {
    format!(
        r#"
        SELECT
            SeriesTitle,
            SearchSeriesTitle,
            COUNT(DISTINCT FileName) AS book_count
        FROM ({} {})
        WHERE SeriesTitle IS NOT NULL
        GROUP BY SeriesTitle, SearchSeriesTitle
        ORDER BY book_count DESC, SeriesTitle COLLATE {}
        "#,
        book_view_sql(),
        predicate.where_clause(),
        CATALOG_COLLATION,
    )
}

fn bind_params<'q>(predicate: &Predicate) -> Result<SqliteArguments<'q>> {
    let mut args = SqliteArguments::default();
    for param in predicate.params() {
        let added = match param {
            SqlParam::Text(s) => args.add(s.clone()),
            SqlParam::Int(i) => args.add(*i),
        };
        added.map_err(|e| anyhow::anyhow!("failed to bind parameter: {}", e))?;
    }
    Ok(args)
}

fn row_to_book(row: &SqliteRow) -> Result<Book> {
    Ok(Book {
        file_name: row.try_get("FileName")?,
        title: row.try_get::<Option<String>, _>("Title")?.unwrap_or_default(),
        search_title: row.try_get("SearchTitle")?,
        search_lang: row.try_get("SearchLang")?,
        author: row.try_get("Author")?,
        last_name: row.try_get("LastName")?,
        first_name: row.try_get("FirstName")?,
        middle_name: row.try_get("MiddleName")?,
        genre: row.try_get("Genre")?,
        genre_parent: row.try_get("GenreParent")?,
        folder: row.try_get("Folder")?,
        ext: row.try_get("Ext")?,
        book_size: row.try_get::<Option<i64>, _>("BookSize")?.unwrap_or(0),
        search_year: row.try_get::<Option<i64>, _>("SearchYear")?.unwrap_or(0),
        update_date: row.try_get("UpdateDate")?,
    })
}

/// SQLite implementation of the [`Catalog`] trait.
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn query_books(&self, predicate: &Predicate, order: SortOrder) -> Result<Vec<Book>> {
        let sql = books_query_sql(predicate, order);
        let rows = sqlx::query_with(&sql, bind_params(predicate)?)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_book).collect()
    }

    async fn count_books(&self, predicate: &Predicate) -> Result<i64> {
        let sql = books_count_sql(predicate);
        let count: i64 = sqlx::query_scalar_with(&sql, bind_params(predicate)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn query_series(&self, predicate: &Predicate) -> Result<Vec<SeriesEntry>> {
        let sql = series_query_sql(predicate);
        let rows = sqlx::query_with(&sql, bind_params(predicate)?)
            .fetch_all(&self.pool)
            .await?;

        let mut series = Vec::with_capacity(rows.len());
        for row in &rows {
            series.push(SeriesEntry {
                title: row.try_get("SeriesTitle")?,
                search_title: row
                    .try_get::<Option<String>, _>("SearchSeriesTitle")?
                    .unwrap_or_default(),
                book_count: row.try_get("book_count")?,
            });
        }
        Ok(series)
    }

    async fn count_series(&self, predicate: &Predicate) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM ({})", series_query_sql(predicate));
        let count: i64 = sqlx::query_scalar_with(&sql, bind_params(predicate)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn parent_genres(&self) -> Result<Vec<String>> {
        let genres: Vec<String> =
            sqlx::query_scalar("SELECT GenreAlias FROM SearchGenres WHERE ParentCode = '0'")
                .fetch_all(&self.pool)
                .await?;
        Ok(genres)
    }

    async fn child_genres(&self, parent: &str) -> Result<Vec<String>> {
        let genres: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT Genres.GenreAlias
            FROM SearchGenres AS Genres
            INNER JOIN SearchGenres AS Parent ON Parent.GenreCode = Genres.ParentCode
            WHERE Parent.GenreAlias LIKE ?
            "#,
        )
        .bind(format!("%{}%", parent))
        .fetch_all(&self.pool)
        .await?;

        Ok(genres
            .into_iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect())
    }

    async fn languages(&self) -> Result<Vec<LanguageCount>> {
        let rows = sqlx::query(
            r#"
            SELECT Lang, COUNT(Lang) AS count
            FROM Books
            WHERE Lang IS NOT NULL AND Lang <> ''
            GROUP BY Lang
            ORDER BY count DESC, Lang
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut langs = Vec::with_capacity(rows.len());
        for row in &rows {
            langs.push(LanguageCount {
                lang: row.try_get("Lang")?,
                count: row.try_get("count")?,
            });
        }
        Ok(langs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booklens_core::engine::build_predicate;
    use booklens_core::predicate::Filters;

    #[test]
    fn test_select_list_groups_by_key() {
        let list = grouped_select_list();
        assert!(list.starts_with("FileName, MAX(Title) AS Title"));
        assert!(!list.contains("MAX(FileName)"));
    }

    #[test]
    fn test_books_sql_orders_by_update_date() {
        let p = build_predicate("Толстой", &Filters::default());
        let sql = books_query_sql(&p, SortOrder::Asc);
        assert!(sql.ends_with("GROUP BY FileName ORDER BY UpdateDate ASC, FileName"));
        assert!(sql.contains("WHERE FullSearch LIKE ?"));
    }

    #[test]
    fn test_full_search_strips_punctuation() {
        let sql = book_view_sql();
        assert!(sql.contains("STRIP_PUNCTUATION(' ' || coalesce(Books.SearchTitle, '')"));
        assert!(!sql.contains("replace("));
    }

    #[test]
    fn test_bind_params_count() {
        let p = build_predicate("год: 1990-2000, автор: Пелевин", &Filters::default());
        assert_eq!(p.params().len(), 3);
        assert!(bind_params(&p).is_ok());
    }
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tempfile::TempDir;

use booklens::config::{CatalogConfig, Config, SearchConfig, SessionConfig, SettingsConfig};
use booklens::db;
use booklens::schema::create_catalog_schema;

pub struct FixtureBook {
    pub id: i64,
    pub title: &'static str,
    pub lang: &'static str,
    pub size: i64,
    pub file_name: &'static str,
    pub updated: &'static str,
    pub series: Option<i64>,
    pub authors: &'static [i64],
    pub genres: &'static [&'static str],
    pub year: i64,
}

/// Three Lukyanenko "Дозоры" books (one co-written, with two genres), one
/// standalone Lukyanenko novel and two Christie novels in two series, one
/// of them with an apostrophe in its name.
pub const BOOKS: &[FixtureBook] = &[
    FixtureBook {
        id: 1,
        title: "Ночной дозор",
        lang: "ru",
        size: 900_000,
        file_name: "101",
        updated: "2020-01-01",
        series: Some(1),
        authors: &[1],
        genres: &["sf_space"],
        year: 1998,
    },
    FixtureBook {
        id: 2,
        title: "Дневной дозор",
        lang: "ru",
        size: 700_000,
        file_name: "102",
        updated: "2021-01-01",
        series: Some(1),
        authors: &[1, 2],
        genres: &["sf_space", "det_classic"],
        year: 2000,
    },
    FixtureBook {
        id: 3,
        title: "Сумеречный дозор",
        lang: "ru",
        size: 500_000,
        file_name: "103",
        updated: "2022-01-01",
        series: Some(1),
        authors: &[1],
        genres: &["sf_space"],
        year: 2003,
    },
    FixtureBook {
        id: 4,
        title: "Спектр",
        lang: "ru",
        size: 1_200_000,
        file_name: "104",
        updated: "2018-01-01",
        series: None,
        authors: &[1],
        genres: &["sf_space"],
        year: 2002,
    },
    FixtureBook {
        id: 5,
        title: "Murder on the Orient Express",
        lang: "en",
        size: 300_000,
        file_name: "201",
        updated: "2019-06-01",
        series: Some(2),
        authors: &[3],
        genres: &["det_classic"],
        year: 1934,
    },
    FixtureBook {
        id: 6,
        title: "The Mysterious Affair at Styles",
        lang: "en",
        size: 250_000,
        file_name: "202",
        updated: "2017-01-01",
        series: Some(3),
        authors: &[3],
        genres: &["det_classic"],
        year: 1920,
    },
];

const AUTHORS: &[(i64, &str, &str)] = &[
    (1, "Лукьяненко", "Сергей"),
    (2, "Васильев", "Владимир"),
    (3, "Christie", "Agatha"),
];

const SERIES: &[(i64, &str)] = &[(1, "Дозоры"), (2, "Hercule Poirot"), (3, "Poirot's Cases")];

const GENRES: &[(&str, &str, &str)] = &[
    ("sf", "0", "Фантастика"),
    ("sf_space", "sf", "Космическая фантастика"),
    ("det", "0", "Детективы"),
    ("det_classic", "det", "Классический детектив"),
];

pub async fn populate(pool: &SqlitePool) {
    create_catalog_schema(pool).await.unwrap();

    for (code, parent, alias) in GENRES {
        sqlx::query(
            "INSERT INTO SearchGenres (GenreCode, ParentCode, GenreAlias, SearchGenre) VALUES (?, ?, ?, ?)",
        )
        .bind(*code)
        .bind(*parent)
        .bind(*alias)
        .bind(alias.to_uppercase())
        .execute(pool)
        .await
        .unwrap();
    }

    for (id, last, first) in AUTHORS {
        sqlx::query(
            "INSERT INTO Authors (AuthorID, LastName, FirstName, SearchName) VALUES (?, ?, ?, ?)",
        )
        .bind(*id)
        .bind(*last)
        .bind(*first)
        .bind(format!("{} {}", last, first).to_uppercase())
        .execute(pool)
        .await
        .unwrap();
    }

    for (id, title) in SERIES {
        insert_series(pool, *id, title, Some(title.to_uppercase().as_str())).await;
    }

    for book in BOOKS {
        insert_book(pool, book).await;
    }
}

pub async fn insert_series(pool: &SqlitePool, id: i64, title: &str, search_title: Option<&str>) {
    sqlx::query("INSERT INTO Series (SeriesID, SeriesTitle, SearchSeriesTitle) VALUES (?, ?, ?)")
        .bind(id)
        .bind(title)
        .bind(search_title)
        .execute(pool)
        .await
        .unwrap();
}

/// Inserts one book with its author, genre and metadata rows. Authors and
/// genres must already exist.
pub async fn insert_book(pool: &SqlitePool, book: &FixtureBook) {
    sqlx::query(
        r#"
        INSERT INTO Books
            (BookID, Title, SearchTitle, Lang, SearchLang, BookSize, Folder, FileName, Ext, UpdateDate, SeriesID)
        VALUES (?, ?, ?, ?, ?, ?, 'lib.rus.ec.zip', ?, '.fb2', ?, ?)
        "#,
    )
    .bind(book.id)
    .bind(book.title)
    .bind(book.title.to_uppercase())
    .bind(book.lang)
    .bind(book.lang.to_uppercase())
    .bind(book.size)
    .bind(book.file_name)
    .bind(book.updated)
    .bind(book.series)
    .execute(pool)
    .await
    .unwrap();

    for author in book.authors {
        sqlx::query("INSERT INTO Author_List (AuthorID, BookID) VALUES (?, ?)")
            .bind(*author)
            .bind(book.id)
            .execute(pool)
            .await
            .unwrap();
    }
    for genre in book.genres {
        sqlx::query("INSERT INTO Genre_List (GenreCode, BookID) VALUES (?, ?)")
            .bind(*genre)
            .bind(book.id)
            .execute(pool)
            .await
            .unwrap();
    }
    sqlx::query("INSERT INTO Books_Meta (BookID, Year, SearchYear) VALUES (?, ?, ?)")
        .bind(book.id)
        .bind(book.year.to_string())
        .bind(book.year)
        .execute(pool)
        .await
        .unwrap();
}

pub fn test_config(root: &Path) -> Config {
    Config {
        catalog: CatalogConfig {
            path: root.join("data").join("catalog.hlc2"),
            max_connections: 2,
        },
        settings: SettingsConfig {
            path: root.join("data").join("settings.sqlite"),
        },
        search: SearchConfig::default(),
        session: SessionConfig::default(),
    }
}

/// A temp dir holding a populated catalog, and a config pointing at it.
pub async fn setup_catalog() -> (TempDir, Config) {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    let pool = db::connect_catalog_rw(&config.catalog.path).await.unwrap();
    populate(&pool).await;
    pool.close().await;

    (tmp, config)
}

pub fn write_config_file(root: &Path, config: &Config) -> PathBuf {
    let content = format!(
        r#"[catalog]
path = "{}"

[settings]
path = "{}"
"#,
        config.catalog.path.display(),
        config.settings.path.display()
    );
    let path = root.join("booklens.toml");
    std::fs::write(&path, content).unwrap();
    path
}

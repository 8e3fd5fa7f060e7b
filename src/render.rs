//! Plain-text rendering of [`Reply`] values for the terminal.

use std::fmt::Write;

use booklens_core::models::{Book, SearchMode, SeriesEntry};
use booklens_core::pagination::PageView;
use booklens_core::service::{Reply, SettingMenu};

use crate::stats::format_bytes;

/// "Showing 21-40 of 45 books" style header.
pub fn header(start: i64, end: i64, total: i64, noun: &str, series: Option<&str>) -> String {
    let mut out = format!("Showing {}-{} of {} {}", start, end, total, noun);
    if let Some(name) = series {
        let _ = write!(out, " in series '{}'", name);
    }
    out
}

fn pager<T>(view: &PageView<T>) -> String {
    let mut controls = Vec::new();
    if view.has_prev() {
        controls.push(":first");
        controls.push(":prev");
    }
    if view.has_next() {
        controls.push(":next");
        controls.push(":last");
    }
    format!(
        "page {}/{}  {}",
        view.index + 1,
        view.page_count,
        controls.join(" ")
    )
}

fn book_line(n: i64, book: &Book) -> String {
    let mut line = format!("{:>3}. {}", n, book.title);
    let author = book.author_display();
    if !author.is_empty() {
        let _ = write!(line, " / {}", author);
    }
    let ext = book.ext.as_deref().unwrap_or("").trim_start_matches('.');
    let _ = write!(line, "  [{}, {}]", ext, format_bytes(book.book_size.max(0) as u64));
    if book.search_year > 0 {
        let _ = write!(line, " {}", book.search_year);
    }
    line
}

fn series_line(n: i64, position: usize, series: &SeriesEntry) -> String {
    format!(
        "{:>3}. {} ({} books)  :series {}",
        n, series.title, series.book_count, position
    )
}

fn render_menu(menu: &SettingMenu) -> String {
    let mut out = format!("{}:\n", menu.title);
    for option in &menu.options {
        let mark = if option.selected { "*" } else { " " };
        let _ = writeln!(out, "  {} {:<14} {}", mark, option.label, option.action);
    }
    out
}

pub fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Books { view, series } => {
            let mut out = header(view.start, view.end, view.total, "books", series.as_deref());
            out.push('\n');
            for (i, book) in view.items.iter().enumerate() {
                let _ = writeln!(out, "{}", book_line(view.start + i as i64, book));
            }
            out.push_str(&pager(view));
            if series.is_some() {
                out.push_str("  :back");
            }
            out
        }
        Reply::Series { view } => {
            let mut out = header(view.start, view.end, view.total, "series", None);
            out.push('\n');
            for (i, series) in view.items.iter().enumerate() {
                let _ = writeln!(out, "{}", series_line(view.start + i as i64, i, series));
            }
            out.push_str(&pager(view));
            out
        }
        Reply::NoResults { series: Some(name), .. } => {
            format!("No books found in series '{}'.", name)
        }
        Reply::NoResults {
            mode: SearchMode::Series,
            ..
        } => "No matching series. Try other search terms.".to_string(),
        Reply::NoResults { .. } => "No results.".to_string(),
        Reply::ParentGenres { genres } => {
            let mut out = String::from("Genres:\n");
            for g in genres {
                let _ = writeln!(out, "  {}", g);
            }
            out
        }
        Reply::Genres { parent, genres } => {
            let mut out = format!("{}:\n", parent);
            for g in genres {
                let _ = writeln!(out, "  {}", g);
            }
            out
        }
        Reply::Languages { languages } => {
            let mut out = String::from("Languages:\n");
            for l in languages {
                let _ = writeln!(out, "  {:<4} {:>8}", l.lang, l.count);
            }
            out
        }
        Reply::SettingsMenu { settings } => {
            let mut out = String::from("Settings:\n");
            for s in settings {
                let current = if s.current.is_empty() { "-" } else { &s.current };
                let _ = writeln!(out, "  {:<26} {:<10} ({})", s.title, current, s.key);
            }
            out
        }
        Reply::SettingOptions { menu } => render_menu(menu),
        Reply::SettingApplied { menu } => format!("Saved.\n{}", render_menu(menu)),
        Reply::Blocked => "Access to the library is blocked for this user.".to_string(),
        Reply::SessionExpired => "No active search. Send a new query.".to_string(),
        Reply::NotFound => "That series is no longer in the result list.".to_string(),
    }
}

//! Query language parsing.
//!
//! A query is either a list of structured criteria (`автор: Толстой,
//! год: 1950-1960`) or, when no criterion syntax is present, a plain bag of
//! words. [`parse_query`] handles the first form and returns an empty list
//! for the second; [`split_words`] tokenizes free text.
//!
//! # Criteria syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `name: value` | substring match on the criterion's field |
//! | `name: a\|b` | `a` OR `b` on the same field |
//! | `серия: 'Title'` | exact series match (quotes may be `'` or `"`; double a quote to embed it) |
//! | `год: 1991` / `-1991` / `1991-` / `1991-1995` | year equality / bounds |
//!
//! Text before the first or after the last criterion becomes an implicit
//! full-text criterion.
//!
//! # Control characters
//!
//! A value or word may start with `!` or `~` (exclude) or `=` (exact match).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static SERIES_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(серия)\s*:\s*('(?:[^']|'')*'|"(?:[^"]|"")*")"#).expect("valid quoted-series pattern")
});

static CRITERION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(автор|название|жанр|язык|серия|год|город|издательство|рейтинг|полный)\s*:\s*([^,;\n]+)",
    )
    .expect("valid criterion pattern")
});

/// A searchable field of the query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Criterion {
    Author,
    Title,
    Genre,
    Language,
    Series,
    Year,
    City,
    Publisher,
    Rating,
    FullText,
}

impl Criterion {
    pub const ALL: [Criterion; 10] = [
        Criterion::Author,
        Criterion::Title,
        Criterion::Genre,
        Criterion::Language,
        Criterion::Series,
        Criterion::Year,
        Criterion::City,
        Criterion::Publisher,
        Criterion::Rating,
        Criterion::FullText,
    ];

    /// Looks up a criterion by its query-language keyword (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == lower)
    }

    /// Query-language keyword.
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::Author => "автор",
            Criterion::Title => "название",
            Criterion::Genre => "жанр",
            Criterion::Language => "язык",
            Criterion::Series => "серия",
            Criterion::Year => "год",
            Criterion::City => "город",
            Criterion::Publisher => "издательство",
            Criterion::Rating => "рейтинг",
            Criterion::FullText => "полный",
        }
    }

    /// Backing column in the denormalized book view.
    pub fn column(&self) -> &'static str {
        match self {
            Criterion::Author => "Author",
            Criterion::Title => "SearchTitle",
            Criterion::Genre => "GenreUpper",
            Criterion::Language => "SearchLang",
            Criterion::Series => "SearchSeriesTitle",
            Criterion::Year => "SearchYear",
            Criterion::City => "SearchCity",
            Criterion::Publisher => "SearchPublisher",
            Criterion::Rating => "LibRate",
            Criterion::FullText => "FullSearch",
        }
    }

    /// Numeric columns compare against integer parameters.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Criterion::Year | Criterion::Rating)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comparison applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Like,
    NotLike,
    Equals,
    LessEqual,
    GreaterEqual,
}

/// How a criterion joins its neighbours on the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Combinator {
    And,
    Or,
}

/// One structured filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCriterion {
    pub criterion: Criterion,
    pub value: String,
    pub operator: Operator,
    pub combinator: Combinator,
}

impl SearchCriterion {
    pub fn new(
        criterion: Criterion,
        value: impl Into<String>,
        operator: Operator,
        combinator: Combinator,
    ) -> Self {
        Self {
            criterion,
            value: value.into(),
            operator,
            combinator,
        }
    }

    pub fn column(&self) -> &'static str {
        self.criterion.column()
    }
}

/// One free-text word with its control-character operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchWord {
    pub word: String,
    pub operator: Operator,
}

/// Strips a leading control character and returns the operator it selects.
///
/// `!` and `~` exclude, `=` asks for an exact match, anything else is a
/// substring match.
pub fn parse_control(token: &str) -> (String, Operator) {
    let token = token.trim();
    let mut chars = token.chars();
    let operator = match chars.next() {
        Some('!') | Some('~') => Operator::NotLike,
        Some('=') => Operator::Equals,
        _ => return (token.to_string(), Operator::Like),
    };
    (chars.as_str().trim().to_string(), operator)
}

/// Splits free text into words, dropping tokens of one character or less.
pub fn split_words(text: &str) -> Vec<SearchWord> {
    text.split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .filter_map(|token| {
            let (word, operator) = parse_control(token);
            (!word.is_empty()).then_some(SearchWord { word, operator })
        })
        .collect()
}

struct RawMatch<'t> {
    start: usize,
    end: usize,
    name: &'t str,
    value: String,
}

/// Parses criteria syntax out of `text`.
///
/// Returns an empty list when no criterion is present; the caller then falls
/// back to [`split_words`].
pub fn parse_query(text: &str) -> Vec<SearchCriterion> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<RawMatch<'_>> = Vec::new();

    // Quoted series first; blank them out so the generic pattern cannot
    // split their content. Blanking keeps byte offsets aligned with `text`.
    let mut blanked = text.to_string();
    for caps in SERIES_QUOTED.captures_iter(text) {
        let (Some(whole), Some(name), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        blanked.replace_range(whole.range(), &" ".repeat(whole.len()));
        matches.push(RawMatch {
            start: whole.start(),
            end: whole.end(),
            name: name.as_str(),
            value: value.as_str().to_string(),
        });
    }

    for caps in CRITERION.captures_iter(&blanked) {
        let (Some(whole), Some(name), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        matches.push(RawMatch {
            start: whole.start(),
            end: whole.end(),
            // Offsets are shared with `text`, so borrow the name from it.
            name: &text[name.range()],
            value: collapse_whitespace(value.as_str()),
        });
    }

    if matches.is_empty() {
        return Vec::new();
    }
    matches.sort_by_key(|m| m.start);

    let first_start = matches[0].start;
    let last_end = matches.iter().map(|m| m.end).max().unwrap_or(first_start);
    let is_separator = |c: char| c.is_whitespace() || c == ',' || c == ';';
    let left = text[..first_start].trim_matches(is_separator);
    let right = text[last_end..].trim_matches(is_separator);
    let free_text = if !left.is_empty() { left } else { right };

    let mut pairs: Vec<(Criterion, String)> = Vec::with_capacity(matches.len() + 1);
    if !free_text.is_empty() {
        pairs.push((Criterion::FullText, free_text.to_string()));
    }
    for m in matches {
        match Criterion::from_name(m.name) {
            Some(criterion) => pairs.push((criterion, m.value)),
            None => tracing::debug!(name = m.name, "dropping unknown criterion"),
        }
    }

    let mut results = Vec::new();
    for (criterion, value) in pairs {
        expand_criterion(criterion, value.trim(), &mut results);
    }
    tracing::debug!(query = text, criteria = results.len(), "parsed criteria");
    results
}

fn expand_criterion(criterion: Criterion, value: &str, out: &mut Vec<SearchCriterion>) {
    match criterion {
        Criterion::Series if is_quoted(value) => {
            let quote = &value[..1];
            let inner = value[1..value.len() - 1].replace(&quote.repeat(2), quote);
            let inner = inner.trim();
            if !inner.is_empty() {
                out.push(SearchCriterion::new(
                    criterion,
                    inner,
                    Operator::Equals,
                    Combinator::And,
                ));
            }
        }
        Criterion::Year => expand_year(value, out),
        Criterion::FullText => {
            let parts = or_parts(value);
            let combinator = combinator_for(&parts);
            for part in parts {
                for word in split_words(part) {
                    out.push(SearchCriterion::new(
                        criterion,
                        word.word,
                        word.operator,
                        combinator,
                    ));
                }
            }
        }
        _ => {
            let parts = or_parts(value);
            let combinator = combinator_for(&parts);
            for part in parts {
                let (word, operator) = parse_control(part);
                if !word.is_empty() {
                    out.push(SearchCriterion::new(criterion, word, operator, combinator));
                }
            }
        }
    }
}

fn expand_year(value: &str, out: &mut Vec<SearchCriterion>) {
    let mut push = |v: &str, op: Operator| {
        let v = v.trim();
        if !v.is_empty() {
            out.push(SearchCriterion::new(Criterion::Year, v, op, Combinator::And));
        }
    };

    if let Some(upper) = value.strip_prefix('-') {
        push(upper, Operator::LessEqual);
    } else if let Some(lower) = value.strip_suffix('-') {
        push(lower, Operator::GreaterEqual);
    } else if let Some((from, to)) = value.split_once('-') {
        push(from, Operator::GreaterEqual);
        push(to, Operator::LessEqual);
    } else {
        push(value, Operator::Equals);
    }
}

fn or_parts(value: &str) -> Vec<&str> {
    value
        .split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn combinator_for(parts: &[&str]) -> Combinator {
    if parts.len() > 1 {
        Combinator::Or
    } else {
        Combinator::And
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2
        && ((value.starts_with('\'') && value.ends_with('\''))
            || (value.starts_with('"') && value.ends_with('"')))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

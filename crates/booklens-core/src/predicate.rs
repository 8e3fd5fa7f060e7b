//! WHERE-clause construction for the denormalized book view.
//!
//! Every user-derived value is bound as a `?` parameter. The only literals
//! ever written into the clause text are column names from
//! [`Criterion::column`], the validated [`LangCode`] and the [`SizeLimit`]
//! token, all drawn from closed vocabularies.
//!
//! Matching is case-insensitive by canonicalization: values are upper-cased
//! here and the catalog stores upper-cased `Search*` columns.
//!
//! When no search condition survives (empty query, only short words, only
//! unparseable numbers) the predicate is the closed condition `1=2`, so an
//! empty query never turns into a catalog scan.

use serde::Serialize;

use crate::criteria::{Combinator, Criterion, Operator, SearchCriterion, SearchWord};
use crate::models::{LangCode, SizeLimit};

/// Column holding the punctuation-stripped, space-padded concatenation of
/// title, author, series, genre and language.
pub const FULL_SEARCH_COLUMN: &str = "FullSearch";

/// Condition that selects no rows.
pub const MATCH_NOTHING: &str = "1=2";

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// User-level filters appended to every search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub lang: Option<LangCode>,
    pub size_limit: Option<SizeLimit>,
}

/// A WHERE condition and its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    condition: String,
    params: Vec<SqlParam>,
}

impl Predicate {
    /// The closed predicate.
    pub fn match_nothing() -> Self {
        Self {
            condition: MATCH_NOTHING.to_string(),
            params: Vec::new(),
        }
    }

    /// Condition text without the `WHERE` keyword.
    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn where_clause(&self) -> String {
        format!("WHERE {}", self.condition)
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// True when the predicate can never match.
    pub fn is_closed(&self) -> bool {
        self.condition == MATCH_NOTHING
    }

    fn from_conditions(conditions: Vec<Condition>, filters: &Filters) -> Self {
        if conditions.is_empty() {
            return Self::match_nothing();
        }

        let mut parts = Vec::with_capacity(conditions.len() + 2);
        let mut params = Vec::new();
        for c in conditions {
            parts.push(c.sql);
            params.extend(c.params);
        }

        if let Some(lang) = &filters.lang {
            parts.push(format!("SearchLang LIKE '{}'", lang.to_search_form()));
        }
        if let Some(size) = &filters.size_limit {
            parts.push(format!("BookSizeCat = '{}'", size.as_token()));
        }

        Self {
            condition: parts.join(" AND "),
            params,
        }
    }
}

struct Condition {
    sql: String,
    params: Vec<SqlParam>,
}

impl Condition {
    fn single(sql: String, param: SqlParam) -> Self {
        Self {
            sql,
            params: vec![param],
        }
    }
}

/// Builds the predicate for free-word mode.
///
/// Each word is matched as a whole word against [`FULL_SEARCH_COLUMN`]
/// (`% WORD %`); `=word` matches the field with no wildcards at all.
pub fn build_for_words(words: &[SearchWord], filters: &Filters) -> Predicate {
    let conditions = words
        .iter()
        .filter(|w| !w.word.is_empty())
        .map(|w| {
            let upper = w.word.to_uppercase();
            match w.operator {
                Operator::Equals => Condition::single(
                    format!("{} LIKE ?", FULL_SEARCH_COLUMN),
                    SqlParam::Text(upper),
                ),
                Operator::NotLike => Condition::single(
                    format!("{} NOT LIKE ?", FULL_SEARCH_COLUMN),
                    SqlParam::Text(format!("% {} %", upper)),
                ),
                _ => Condition::single(
                    format!("{} LIKE ?", FULL_SEARCH_COLUMN),
                    SqlParam::Text(format!("% {} %", upper)),
                ),
            }
        })
        .collect();

    Predicate::from_conditions(conditions, filters)
}

/// Builds the predicate for criteria mode.
///
/// AND criteria become one condition each, in input order. OR criteria are
/// grouped by backing column into one parenthesized disjunction per column,
/// appended after the AND conditions in order of first appearance.
pub fn build_for_criteria(criteria: &[SearchCriterion], filters: &Filters) -> Predicate {
    let mut conditions: Vec<Condition> = Vec::new();
    let mut or_groups: Vec<(&'static str, Vec<Condition>)> = Vec::new();

    for c in criteria {
        let Some(condition) = criterion_condition(c) else {
            tracing::debug!(criterion = %c.criterion, value = %c.value, "criterion produced no condition");
            continue;
        };
        match c.combinator {
            Combinator::And => conditions.push(condition),
            Combinator::Or => {
                let column = c.column();
                match or_groups.iter_mut().find(|(col, _)| *col == column) {
                    Some((_, group)) => group.push(condition),
                    None => or_groups.push((column, vec![condition])),
                }
            }
        }
    }

    for (_, group) in or_groups {
        let mut sql = Vec::with_capacity(group.len());
        let mut params = Vec::with_capacity(group.len());
        for c in group {
            sql.push(c.sql);
            params.extend(c.params);
        }
        conditions.push(Condition {
            sql: format!("({})", sql.join(" OR ")),
            params,
        });
    }

    Predicate::from_conditions(conditions, filters)
}

fn criterion_condition(c: &SearchCriterion) -> Option<Condition> {
    let column = c.column();
    let value = c.value.trim();
    if value.is_empty() {
        return None;
    }

    let comparison = match c.operator {
        Operator::Like => "LIKE",
        Operator::NotLike => "NOT LIKE",
        Operator::Equals => "=",
        Operator::LessEqual => "<=",
        Operator::GreaterEqual => ">=",
    };
    let sql = format!("{} {} ?", column, comparison);

    let param = match c.operator {
        Operator::Like | Operator::NotLike => {
            // Free-text chunks match whole words; single fields match substrings.
            let upper = value.to_uppercase();
            if c.criterion == Criterion::FullText {
                SqlParam::Text(format!("% {} %", upper))
            } else {
                SqlParam::Text(format!("%{}%", upper))
            }
        }
        Operator::Equals | Operator::LessEqual | Operator::GreaterEqual => {
            if c.criterion.is_numeric() {
                SqlParam::Int(value.parse::<i64>().ok()?)
            } else {
                SqlParam::Text(value.to_uppercase())
            }
        }
    };

    Some(Condition::single(sql, param))
}

//! # Booklens Core
//!
//! Query language, predicate builder, search engine, pagination and
//! session state for searching an external book catalog.
//!
//! This crate contains no sqlx, tokio or filesystem access. Storage comes
//! in through the [`catalog::Catalog`] and [`settings::SettingsStore`]
//! traits; the `booklens` crate provides the SQLite implementations.
//!
//! ```text
//! text ─► criteria ─► predicate ─► engine ─► pagination ─► service ─► Reply
//!                                   ▲                        ▲
//!                               Catalog            SettingsStore, SessionStore
//! ```

pub mod actions;
pub mod catalog;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod models;
pub mod pagination;
pub mod predicate;
pub mod service;
pub mod session;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

//! # booklens
//!
//! SQLite adapters and command-line front end for the `booklens-core`
//! search engine.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │  catalog.db  │──▶│  booklens-core   │◀──│ settings.db  │
//! │ (read-only)  │   │ engine + service │   │ (per user)   │
//! └──────────────┘   └────────┬─────────┘   └──────────────┘
//!                             │
//!                    ┌────────┴────────┐
//!                    ▼                 ▼
//!              ┌──────────┐      ┌──────────┐
//!              │ one-shot │      │  shell   │
//!              │ commands │      │ (paging) │
//!              └──────────┘      └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Pool construction for both databases |
//! | [`schema`] | Empty catalog schema |
//! | [`migrate`] | Settings schema migrations |
//! | [`sqlite_catalog`] | `Catalog` over the catalog database |
//! | [`sqlite_functions`] | SQL functions registered on catalog connections |
//! | [`sqlite_settings`] | `SettingsStore` over the settings database |
//! | [`app`] | Wiring of the service |
//! | [`render`] | Terminal rendering of replies |
//! | [`sweeper`] | Idle session eviction task |
//! | [`search`], [`settings_cmd`], [`stats`], [`shell`] | Commands |

pub mod app;
pub mod config;
pub mod db;
pub mod migrate;
pub mod render;
pub mod schema;
pub mod search;
pub mod settings_cmd;
pub mod shell;
pub mod sqlite_catalog;
pub mod sqlite_functions;
pub mod sqlite_settings;
pub mod stats;
pub mod sweeper;

//! TOML configuration.
//!
//! ```toml
//! [catalog]
//! path = "./data/library.hlc2"
//!
//! [settings]
//! path = "./data/settings.sqlite"
//! ```
//!
//! Everything else has a default. See `config/booklens.example.toml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use booklens_core::models::{DEFAULT_MAX_BOOKS, MAX_BOOKS_LIMIT};
use booklens_core::service::ServiceOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub settings: SettingsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// The externally built library database. Opened read-only.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_books")]
    pub default_max_books: u32,
    #[serde(default = "default_max_books_options")]
    pub max_books_options: Vec<u32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_books: default_max_books(),
            max_books_options: default_max_books_options(),
        }
    }
}

fn default_max_books() -> u32 {
    DEFAULT_MAX_BOOKS
}
fn default_max_books_options() -> Vec<u32> {
    vec![20, 40]
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Upper bound for the session timings: one year.
pub const MAX_SESSION_SECS: u64 = 365 * 24 * 3600;

fn default_idle_timeout_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Config {
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            max_books_options: self.search.max_books_options.clone(),
            idle_timeout: chrono::Duration::seconds(self.session.idle_timeout_secs as i64),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.catalog.max_connections == 0 {
        anyhow::bail!("catalog.max_connections must be > 0");
    }

    let search = &config.search;
    if !(1..=MAX_BOOKS_LIMIT).contains(&search.default_max_books) {
        anyhow::bail!("search.default_max_books must be in [1, {}]", MAX_BOOKS_LIMIT);
    }
    if search.max_books_options.is_empty() {
        anyhow::bail!("search.max_books_options must not be empty");
    }
    if let Some(bad) = search
        .max_books_options
        .iter()
        .find(|n| !(1..=MAX_BOOKS_LIMIT).contains(*n))
    {
        anyhow::bail!(
            "search.max_books_options: {} is outside [1, {}]",
            bad,
            MAX_BOOKS_LIMIT
        );
    }

    let session = &config.session;
    for (key, secs) in [
        ("idle_timeout_secs", session.idle_timeout_secs),
        ("sweep_interval_secs", session.sweep_interval_secs),
    ] {
        if !(1..=MAX_SESSION_SECS).contains(&secs) {
            anyhow::bail!("session.{} must be in [1, {}]", key, MAX_SESSION_SECS);
        }
    }

    Ok(config)
}

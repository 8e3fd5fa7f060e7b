//! # booklens CLI
//!
//! Search a book catalog by author, title, series, genre and other fields,
//! page through the results, and keep per-user search preferences.
//!
//! ## Usage
//!
//! ```bash
//! booklens --config ./config/booklens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `booklens init` | Create or upgrade the settings database |
//! | `booklens init-catalog` | Create an empty catalog (development) |
//! | `booklens search "<query>"` | Search books, or series with `--series` |
//! | `booklens genres [PARENT]` | List parent genres, or the genres under one |
//! | `booklens langs` | List catalog languages with book counts |
//! | `booklens settings show\|set` | Inspect or change a user's settings |
//! | `booklens stats` | Catalog statistics |
//! | `booklens shell` | Interactive session with paging |
//!
//! ## Examples
//!
//! ```bash
//! booklens search "Толстой, название: война"
//! booklens search "Лукьяненко" --series
//! booklens settings set --user 42 lang_search en
//! booklens shell --user 42
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use booklens::{config, migrate, schema, search, settings_cmd, shell, stats};

#[derive(Parser)]
#[command(
    name = "booklens",
    about = "Search a local book catalog from the command line",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/booklens.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the settings database. Safe to run repeatedly.
    Init,

    /// Create an empty catalog with the expected tables at the configured path.
    InitCatalog,

    /// Search the catalog.
    ///
    /// Plain words match against the combined author/title/series/genre
    /// text. Use `field: value` pairs separated by commas for targeted
    /// search, e.g. `автор: Толстой, год: 1860-1870`.
    Search {
        query: String,

        /// User whose settings (language, sort order, page size) apply.
        #[arg(long, default_value_t = 0)]
        user: i64,

        /// Search series names instead of books.
        #[arg(long)]
        series: bool,

        /// Zero-based page of results to print.
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Print the reply as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List parent genres, or the genres under PARENT.
    Genres {
        parent: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List catalog languages with book counts.
    Langs {
        #[arg(long)]
        json: bool,
    },

    /// Inspect or change a user's stored settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Print catalog statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Interactive search session reading commands from stdin.
    Shell {
        #[arg(long, default_value_t = 0)]
        user: i64,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show current settings.
    Show {
        #[arg(long, default_value_t = 0)]
        user: i64,

        #[arg(long)]
        json: bool,
    },
    /// Change one setting, e.g. `set max_books 40`. An empty VALUE clears
    /// `lang_search` and `size_limit`.
    Set {
        #[arg(long, default_value_t = 0)]
        user: i64,

        key: String,

        #[arg(default_value = "")]
        value: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Settings database initialized successfully.");
        }
        Commands::InitCatalog => {
            schema::run_init_catalog(&cfg).await?;
            println!("Catalog created at {}.", cfg.catalog.path.display());
        }
        Commands::Search {
            query,
            user,
            series,
            page,
            json,
        } => {
            search::run_search(&cfg, &query, user, series, page, json).await?;
        }
        Commands::Genres { parent, json } => {
            search::run_genres(&cfg, parent, json).await?;
        }
        Commands::Langs { json } => {
            search::run_langs(&cfg, json).await?;
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show { user, json } => {
                settings_cmd::run_show(&cfg, user, json).await?;
            }
            SettingsAction::Set { user, key, value } => {
                settings_cmd::run_set(&cfg, user, &key, &value).await?;
            }
        },
        Commands::Stats { json } => {
            stats::run_stats(&cfg, json).await?;
        }
        Commands::Shell { user } => {
            shell::run_shell(&cfg, user).await?;
        }
    }

    Ok(())
}

//! One-shot search commands: `search`, `genres`, `langs`.

use anyhow::Result;

use booklens_core::actions::{Action, SettingValue};
use booklens_core::models::{SearchMode, UserId};
use booklens_core::service::Reply;

use crate::app;
use crate::config::Config;
use crate::render::render_reply;

fn print_reply(reply: &Reply, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
    } else {
        println!("{}", render_reply(reply));
    }
    Ok(())
}

/// Runs a search as `user` and prints page `page` (zero-based) of the
/// results.
pub async fn run_search(
    config: &Config,
    query: &str,
    user: UserId,
    series: bool,
    page: usize,
    json: bool,
) -> Result<()> {
    let service = app::build_service(config).await?;

    if series {
        service
            .handle_action(
                user,
                Action::ApplySetting(SettingValue::SearchType(SearchMode::Series)),
            )
            .await?;
    }

    let mut reply = service.handle_text(user, query).await?;
    if page > 0 {
        let action = match reply {
            Reply::Books { .. } => Some(Action::BooksPage(page)),
            Reply::Series { .. } => Some(Action::SeriesPage(page)),
            _ => None,
        };
        if let Some(action) = action {
            reply = service.handle_action(user, action).await?;
        }
    }

    print_reply(&reply, json)
}

pub async fn run_genres(config: &Config, parent: Option<String>, json: bool) -> Result<()> {
    let service = app::build_service(config).await?;
    let engine = service.engine();
    let reply = match parent {
        Some(parent) => Reply::Genres {
            genres: engine.get_child_genres(&parent).await?,
            parent,
        },
        None => Reply::ParentGenres {
            genres: engine.get_parent_genres().await?,
        },
    };
    print_reply(&reply, json)
}

pub async fn run_langs(config: &Config, json: bool) -> Result<()> {
    let service = app::build_service(config).await?;
    let reply = Reply::Languages {
        languages: service.engine().get_languages().await?,
    };
    print_reply(&reply, json)
}

//! Interactive loop over stdin, standing in for a chat transport.
//!
//! Plain lines are searches. Lines starting with `:` are commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `:next` `:prev` `:first` `:last` | move through the current results |
//! | `:page N` | jump to page N (1-based) |
//! | `:series N` | open the N-th series on the current series page |
//! | `:back` | return from a series' books to the series list |
//! | `:mode books\|series` | what plain lines search for |
//! | `:set KEY [VALUE]` | show options for, or change, a setting |
//! | `:settings` | current settings |
//! | `:genres [PARENT]` `:langs` | reference lists |
//! | `:action STRING` | send a raw callback string |
//! | `:quit` | leave |

use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use booklens_core::actions::{Action, SettingKey, SettingValue};
use booklens_core::models::{SearchMode, UserId};
use booklens_core::pagination::Nav;
use booklens_core::service::Reply;

use crate::app;
use crate::config::Config;
use crate::render::render_reply;
use crate::sweeper::spawn_sweeper;

#[derive(Debug, PartialEq)]
pub enum Input {
    Search(String),
    Navigate(Nav),
    Series(usize),
    Action(Action),
    Help,
    Quit,
}

const HELP: &str = "\
:next :prev :first :last   move through results
:page N                    jump to page N
:series N                  open series N from the list
:back                      back to the series list
:mode books|series         what plain lines search for
:set KEY [VALUE]           show or change a setting
:settings                  show settings
:genres [PARENT]  :langs   reference lists
:action STRING             send a raw callback string
:quit";

pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Search(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    let number = |arg: &str| {
        arg.parse::<usize>()
            .map_err(|_| format!(":{} needs a number", name))
    };

    match name {
        "next" => Ok(Input::Navigate(Nav::Next)),
        "prev" => Ok(Input::Navigate(Nav::Prev)),
        "first" => Ok(Input::Navigate(Nav::First)),
        "last" => Ok(Input::Navigate(Nav::Last)),
        "page" => {
            let n = number(arg)?;
            if n == 0 {
                return Err("pages are numbered from 1".to_string());
            }
            Ok(Input::Navigate(Nav::To(n - 1)))
        }
        "series" => Ok(Input::Series(number(arg)?)),
        "back" => Ok(Input::Action(Action::BackToSeries)),
        "mode" => {
            let mode: SearchMode = arg.parse()?;
            Ok(Input::Action(Action::ApplySetting(SettingValue::SearchType(
                mode,
            ))))
        }
        "set" => {
            let (key, value) = match arg.split_once(char::is_whitespace) {
                Some((key, value)) => (key, Some(value.trim())),
                None => (arg, None),
            };
            let key: SettingKey = key.parse()?;
            match value {
                Some(value) => Ok(Input::Action(Action::ApplySetting(SettingValue::parse(
                    key, value,
                )?))),
                None => Ok(Input::Action(Action::OpenSetting(key))),
            }
        }
        "settings" => Ok(Input::Action(Action::SettingsMenu)),
        "genres" if arg.is_empty() => Ok(Input::Action(Action::ShowGenres(None))),
        "genres" => Ok(Input::Action(Action::ShowGenres(Some(arg.to_string())))),
        "langs" => Ok(Input::Action(Action::ShowLanguages)),
        "action" => Ok(Input::Action(arg.parse()?)),
        "help" => Ok(Input::Help),
        "quit" | "q" | "exit" => Ok(Input::Quit),
        other => Err(format!("unknown command ':{}' (try :help)", other)),
    }
}

pub async fn run_shell(config: &Config, user: UserId) -> Result<()> {
    let service = app::build_service(config).await?;
    let sweeper = spawn_sweeper(
        service.session_store(),
        Duration::from_secs(config.session.sweep_interval_secs),
        service.idle_timeout(),
    );

    let interactive = atty::is(atty::Stream::Stdin);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Page of the last series list shown, for `:series N`.
    let mut series_page = 0;

    if interactive {
        println!("booklens shell, user {}. Type a query or :help.", user);
    }

    loop {
        if interactive {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };

        let result = match input {
            Input::Quit => break,
            Input::Help => {
                println!("{}", HELP);
                continue;
            }
            Input::Search(text) => service.handle_text(user, &text).await,
            Input::Navigate(nav) => service.navigate(user, nav).await,
            Input::Series(index) => {
                service
                    .handle_action(
                        user,
                        Action::ShowSeries {
                            page: series_page,
                            index,
                        },
                    )
                    .await
            }
            Input::Action(action) => service.handle_action(user, action).await,
        };

        match result {
            Ok(reply) => {
                if let Reply::Series { view } = &reply {
                    series_page = view.index;
                }
                println!("{}", render_reply(&reply));
            }
            Err(e) => {
                tracing::error!(user_id = user, error = %e, "request failed");
                println!("Search failed. Please try again later.");
            }
        }
    }

    sweeper.abort();
    Ok(())
}

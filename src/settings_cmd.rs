//! `booklens settings show|set`.

use anyhow::{bail, Result};

use booklens_core::actions::{Action, SettingKey, SettingValue};
use booklens_core::models::UserId;
use booklens_core::service::Reply;

use crate::app;
use crate::config::Config;
use crate::render::render_reply;

pub async fn run_show(config: &Config, user: UserId, json: bool) -> Result<()> {
    let service = app::build_service(config).await?;
    if json {
        let settings = service.user_settings(user).await?;
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let reply = service.handle_action(user, Action::SettingsMenu).await?;
    println!("{}", render_reply(&reply));
    Ok(())
}

pub async fn run_set(config: &Config, user: UserId, key: &str, value: &str) -> Result<()> {
    let key: SettingKey = key.parse().map_err(anyhow::Error::msg)?;
    if key.is_session_only() {
        bail!(
            "'{}' only lasts for an interactive session; use `booklens shell` and `:set {} {}`",
            key,
            key,
            value
        );
    }
    let value = SettingValue::parse(key, value).map_err(anyhow::Error::msg)?;

    let service = app::build_service(config).await?;
    let reply = service
        .handle_action(user, Action::ApplySetting(value))
        .await?;
    if let Reply::Blocked = reply {
        bail!("user {} is blocked", user);
    }
    println!("{}", render_reply(&reply));
    Ok(())
}

//! `ctxbot bot` — start the Telegram bot.

use crate::commands::{build_engine, build_gateway, build_runner};
use ctxbot_channels::{TelegramBot, TelegramConfig};
use ctxbot_config::AppConfig;
use std::sync::Arc;
use tracing::info;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let bot_token = config.require_bot_token()?.to_string();
    let gateway = build_gateway(&config)?;
    let engine = build_engine(&config, gateway.clone());
    let runner = build_runner(&config, gateway)?;

    info!(model = %config.model, "Starting Telegram bot");
    let bot = Arc::new(TelegramBot::new(
        TelegramConfig { bot_token },
        engine,
        runner,
    ));
    bot.run().await?;
    Ok(())
}

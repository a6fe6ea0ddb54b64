//! `ctxbot chat` — interactive terminal chat.

use crate::commands::{build_engine, build_gateway, build_runner};
use ctxbot_channels::repl::ChatRepl;
use ctxbot_config::AppConfig;
use tracing::info;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let gateway = build_gateway(&config)?;
    let engine = build_engine(&config, gateway.clone());
    let runner = build_runner(&config, gateway)?;

    info!(model = %config.model, "Starting terminal chat");
    ChatRepl::new(engine, runner).run().await?;
    Ok(())
}

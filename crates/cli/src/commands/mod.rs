//! Command implementations for the CtxBot CLI.

pub mod bot;
pub mod chat;
pub mod onboard;
pub mod templates_cmd;

use ctxbot_agent::ChatEngine;
use ctxbot_config::AppConfig;
use ctxbot_context::ContextStore;
use ctxbot_core::provider::Provider;
use ctxbot_providers::{CompletionGateway, GatewayDefaults, OpenAiProvider};
use ctxbot_telemetry::UsageLog;
use ctxbot_templates::{PromptCatalog, TemplateRunner};
use std::sync::Arc;

/// Build the completion gateway from config. Fails fast when the API key
/// is missing — no command can work without it.
pub(crate) fn build_gateway(config: &AppConfig) -> Result<Arc<CompletionGateway>, String> {
    let api_key = config
        .require_api_key()
        .map_err(|e| e.to_string())?
        .to_string();

    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::openai(api_key));
    Ok(Arc::new(CompletionGateway::new(
        provider,
        UsageLog::new(config.usage_log_path()),
        GatewayDefaults {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_message: config.system_message.clone(),
        },
    )))
}

/// Build the chat engine (context store + gateway).
pub(crate) fn build_engine(
    config: &AppConfig,
    gateway: Arc<CompletionGateway>,
) -> Arc<ChatEngine> {
    Arc::new(ChatEngine::new(
        Arc::new(ContextStore::new()),
        gateway,
        config.max_context_messages,
    ))
}

/// Load the catalog and build the template runner.
pub(crate) fn build_runner(
    config: &AppConfig,
    gateway: Arc<CompletionGateway>,
) -> Result<Arc<TemplateRunner>, String> {
    let catalog = PromptCatalog::load(&config.prompts_path()).map_err(|e| e.to_string())?;
    Ok(Arc::new(TemplateRunner::new(
        catalog,
        gateway,
        config.template_results_path(),
    )))
}

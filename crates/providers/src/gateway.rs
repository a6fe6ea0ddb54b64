//! The completion gateway — the one place requests to the model service
//! are assembled.
//!
//! Responsibilities:
//! - resolve temperature / max-tokens / system message from configured
//!   defaults when a caller leaves them unset;
//! - prepend the system message (when non-empty) ahead of the conversation;
//! - retry exactly once, without the temperature parameter, when the model
//!   rejects the temperature override;
//! - trim the reply text and normalize missing usage to zeros;
//! - record one usage-log row per completed call (best-effort).
//!
//! Anything else the service rejects propagates to the caller unretried.

use ctxbot_core::error::ProviderError;
use ctxbot_core::message::Message;
use ctxbot_core::provider::{Provider, ProviderRequest, Usage};
use ctxbot_telemetry::{TemperatureUsed, UsageLog};
use std::sync::Arc;
use tracing::warn;

/// Per-call options. Unset fields fall back to [`GatewayDefaults`].
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Model override; `None` uses the configured default.
    pub model: Option<String>,
    /// Temperature override; `None` uses the configured default.
    pub temperature: Option<f32>,
    /// Output token bound; `None` uses the configured default, 0 disables
    /// the bound entirely.
    pub max_tokens: Option<u32>,
    /// System message; `None` uses the configured default, an empty string
    /// (after trimming) sends none.
    pub system_message: Option<String>,
}

/// Defaults applied when a call leaves an option unset. Sourced from config.
#[derive(Debug, Clone)]
pub struct GatewayDefaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_message: String,
}

/// The outcome of one completion call.
#[derive(Debug, Clone)]
pub struct Completion {
    /// First choice content, whitespace-trimmed; empty if the service
    /// returned none.
    pub text: String,
    /// Reported token usage, all-zero if the service returned none.
    pub usage: Usage,
}

/// Builds and issues completion requests against a [`Provider`].
pub struct CompletionGateway {
    provider: Arc<dyn Provider>,
    usage_log: UsageLog,
    defaults: GatewayDefaults,
}

impl CompletionGateway {
    pub fn new(provider: Arc<dyn Provider>, usage_log: UsageLog, defaults: GatewayDefaults) -> Self {
        Self {
            provider,
            usage_log,
            defaults,
        }
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &str {
        &self.defaults.model
    }

    /// Issue a completion for `messages` (ordered, non-empty, no system
    /// entry — the gateway prepends one).
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<Completion, ProviderError> {
        let model = options
            .model
            .unwrap_or_else(|| self.defaults.model.clone());
        let temperature = options.temperature.unwrap_or(self.defaults.temperature);
        let max_tokens = options.max_tokens.unwrap_or(self.defaults.max_tokens);
        let system = options
            .system_message
            .as_deref()
            .unwrap_or(&self.defaults.system_message)
            .trim()
            .to_string();

        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            request_messages.push(Message::system(system));
        }
        request_messages.extend(messages);

        let request = ProviderRequest {
            model,
            messages: request_messages,
            temperature: Some(temperature),
            max_tokens: (max_tokens > 0).then_some(max_tokens),
        };

        let model_name = request.model.clone();
        let mut temperature_used = TemperatureUsed::Value(temperature);
        let response = match self.provider.complete(request.clone()).await {
            Ok(response) => response,
            Err(ProviderError::UnsupportedTemperature { message }) => {
                warn!(
                    temperature,
                    model = %request.model,
                    reason = %message,
                    "Model does not support a temperature override, retrying without it"
                );
                temperature_used = TemperatureUsed::Default;
                let retry = ProviderRequest {
                    temperature: None,
                    ..request
                };
                self.provider.complete(retry).await?
            }
            Err(other) => return Err(other),
        };

        let text = response.message.content.trim().to_string();
        let usage = response.usage.unwrap_or_default();

        // Best-effort accounting; UsageLog swallows write failures.
        self.usage_log.record(&model_name, temperature_used, &usage);

        Ok(Completion { text, usage })
    }
}

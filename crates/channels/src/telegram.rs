//! Telegram entry surface — long-polling Bot API client.
//!
//! Polls `getUpdates` with a 30s long-poll timeout and handles each text
//! message in a spawned task, so a slow completion for one user does not
//! stall the loop for others. Poll failures are logged and retried after a
//! short sleep; a failed turn produces a degraded reply, never a crash.

use crate::{classify, Incoming, EMPTY_REPLY, SERVICE_UNAVAILABLE};
use ctxbot_agent::ChatEngine;
use ctxbot_core::error::ChannelError;
use ctxbot_templates::TemplateRunner;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Telegram limits messages to 4096 chars; stay under it with a margin.
const MAX_MESSAGE_LEN: usize = 4000;

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY_SECS: u64 = 5;

/// Telegram surface configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

/// The long-polling Telegram bot.
pub struct TelegramBot {
    config: TelegramConfig,
    client: reqwest::Client,
    engine: Arc<ChatEngine>,
    runner: Arc<TemplateRunner>,
}

impl TelegramBot {
    pub fn new(
        config: TelegramConfig,
        engine: Arc<ChatEngine>,
        runner: Arc<TemplateRunner>,
    ) -> Self {
        let client = reqwest::Client::builder()
            // must outlast the long-poll timeout
            .timeout(std::time::Duration::from_secs(POLL_TIMEOUT_SECS + 20))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            client,
            engine,
            runner,
        }
    }

    /// Run the polling loop. Returns only on a fatal startup error.
    pub async fn run(self: Arc<Self>) -> Result<(), ChannelError> {
        info!("Telegram bot starting (long polling)");
        let mut offset: i64 = 0;

        loop {
            let updates = match self.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_secs(POLL_RETRY_DELAY_SECS))
                        .await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);

                let Some(message) = update.message else { continue };
                let Some(text) = message.text else { continue };
                let chat_id = message.chat.id;
                let user_id = message.from.map(|u| u.id).unwrap_or(0);

                let bot = Arc::clone(&self);
                tokio::spawn(async move {
                    bot.handle_text(chat_id, user_id, &text).await;
                });
            }
        }
    }

    async fn handle_text(&self, chat_id: i64, user_id: i64, text: &str) {
        let reply = match classify(text) {
            Incoming::Start => self.greeting(),
            Incoming::ListTemplates => self.list_templates(),
            Incoming::RunTemplate(id) => self.run_template(id).await,
            Incoming::Clear => {
                self.engine.clear_history(user_id).await;
                "Context cleared. We can start over.".to_string()
            }
            Incoming::Chat(text) => match self.engine.handle_user_text(user_id, &text).await {
                Ok(reply) if reply.is_empty() => EMPTY_REPLY.to_string(),
                Ok(reply) => reply,
                Err(e) => {
                    error!(user_id, error = %e, "Completion failed");
                    SERVICE_UNAVAILABLE.to_string()
                }
            },
        };

        if let Err(e) = self.send_message(chat_id, &reply).await {
            warn!(chat_id, error = %e, "Failed to send reply");
        }
    }

    fn greeting(&self) -> String {
        format!(
            "Hi! I'm an assistant with conversational memory.\n\
             Just write to me — I reply with the recent context in mind.\n\n\
             Commands:\n\
             /templates — list prompt templates\n\
             /run <id> — run a template\n\
             \"{}\" — reset the conversation",
            ctxbot_agent::CLEAR_PHRASE
        )
    }

    fn list_templates(&self) -> String {
        let catalog = self.runner.catalog();
        let mut lines = vec![format!("Task: {}", catalog.task), String::new()];
        for template in &catalog.prompts {
            lines.push(format!("  {}: {}", template.id, template.name));
        }
        lines.push(String::new());
        lines.push("Run one with /run <id>".to_string());
        lines.join("\n")
    }

    async fn run_template(&self, id: u32) -> String {
        match self.runner.run(id).await {
            Ok(outcome) => {
                let json = serde_json::to_string_pretty(&outcome.result)
                    .unwrap_or_else(|_| outcome.result.to_string());
                format!(
                    "Template #{id}\nValid JSON: {}\nTokens: prompt {}, completion {}, total {}\n\n{json}",
                    if outcome.parsed { "yes" } else { "no" },
                    outcome.usage.prompt_tokens,
                    outcome.usage.completion_tokens,
                    outcome.usage.total_tokens,
                )
            }
            Err(e) => {
                error!(template_id = id, error = %e, "Template run failed");
                format!("Template run failed: {e}")
            }
        }
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ChannelError> {
        let url = format!(
            "https://api.telegram.org/bot{}/getUpdates",
            self.config.bot_token
        );

        let response = self
            .client
            .get(&url)
            .query(&[("timeout", POLL_TIMEOUT_SECS as i64), ("offset", offset)])
            .send()
            .await
            .map_err(|e| ChannelError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Api {
                status_code: status,
                message: body,
            });
        }

        let reply: ApiReply<Vec<Update>> = response
            .json()
            .await
            .map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;

        if !reply.ok {
            return Err(ChannelError::Api {
                status_code: 200,
                message: "getUpdates returned ok=false".into(),
            });
        }

        Ok(reply.result.unwrap_or_default())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.bot_token
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": truncate(text, MAX_MESSAGE_LEN),
            }))
            .send()
            .await
            .map_err(|e| ChannelError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Api {
                status_code: status,
                message: body,
            });
        }

        Ok(())
    }
}

/// Truncate `text` to at most `max` characters, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

// --- Telegram API wire types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    #[serde(default)]
    from: Option<TgUser>,
    chat: TgChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_text_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_text_marks_the_cut() {
        let text = "x".repeat(50);
        let out = truncate(&text, 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncate_is_char_boundary_safe() {
        let text = "привет мир, это длинное сообщение";
        let out = truncate(text, 12);
        assert_eq!(out.chars().count(), 12);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn parse_update_with_text() {
        let data = r#"{
            "ok": true,
            "result": [{
                "update_id": 100,
                "message": {
                    "message_id": 5,
                    "from": {"id": 7, "is_bot": false, "first_name": "A"},
                    "chat": {"id": 7, "type": "private"},
                    "text": "hello"
                }
            }]
        }"#;
        let reply: ApiReply<Vec<Update>> = serde_json::from_str(data).unwrap();
        assert!(reply.ok);
        let updates = reply.result.unwrap();
        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.update_id, 100);
        let message = update.message.as_ref().unwrap();
        assert_eq!(message.text.as_deref(), Some("hello"));
        assert_eq!(message.from.as_ref().unwrap().id, 7);
        assert_eq!(message.chat.id, 7);
    }

    #[test]
    fn parse_update_without_message() {
        let data = r#"{"ok": true, "result": [{"update_id": 1}]}"#;
        let reply: ApiReply<Vec<Update>> = serde_json::from_str(data).unwrap();
        assert!(reply.result.unwrap()[0].message.is_none());
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = TelegramConfig {
            bot_token: "123:secret".into(),
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret"));
    }
}

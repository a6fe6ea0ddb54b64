//! Terminal entry surface — a sequential read/respond loop.
//!
//! Runs under a reserved user id so terminal history never mixes with any
//! chat-platform user. One turn at a time; a failed turn prints a degraded
//! message and the loop continues.

use crate::{classify, Incoming, EMPTY_REPLY, SERVICE_UNAVAILABLE};
use ctxbot_agent::ChatEngine;
use ctxbot_context::UserId;
use ctxbot_templates::TemplateRunner;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::error;

/// Reserved user id for the terminal session.
pub const REPL_USER_ID: UserId = -1;

/// Interactive terminal chat.
pub struct ChatRepl {
    engine: Arc<ChatEngine>,
    runner: Arc<TemplateRunner>,
}

impl ChatRepl {
    pub fn new(engine: Arc<ChatEngine>, runner: Arc<TemplateRunner>) -> Self {
        Self { engine, runner }
    }

    /// Run the loop until EOF or an exit command.
    pub async fn run(&self) -> io::Result<()> {
        let mut stdout = io::stdout();
        let stdin = BufReader::new(io::stdin());
        let mut lines = stdin.lines();

        stdout
            .write_all(
                format!(
                    "Chat with the assistant. Commands: templates, run <id>, \
                     \"{}\" to reset, exit/quit to leave.\n\n",
                    ctxbot_agent::CLEAR_PHRASE
                )
                .as_bytes(),
            )
            .await?;

        loop {
            stdout.write_all(b"you> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break; // EOF (Ctrl+D)
            };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if matches!(line.as_str(), "exit" | "quit") {
                break;
            }

            let output = self.respond(&line).await;
            stdout.write_all(format!("{output}\n\n").as_bytes()).await?;
        }

        stdout.write_all(b"Bye.\n").await?;
        Ok(())
    }

    async fn respond(&self, line: &str) -> String {
        match classify(line) {
            Incoming::Start => "Just type a message to chat.".to_string(),
            Incoming::ListTemplates => {
                let catalog = self.runner.catalog();
                let mut out = format!("Task: {}\n", catalog.task);
                for template in &catalog.prompts {
                    out.push_str(&format!("  {}: {}\n", template.id, template.name));
                }
                out.push_str("Run one with: run <id>");
                out
            }
            Incoming::RunTemplate(id) => match self.runner.run(id).await {
                Ok(outcome) => {
                    let json = serde_json::to_string_pretty(&outcome.result)
                        .unwrap_or_else(|_| outcome.result.to_string());
                    format!(
                        "Valid JSON: {}\nTokens: prompt {}, completion {}, total {}\n{json}",
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
            },
            Incoming::Clear => {
                self.engine.clear_history(REPL_USER_ID).await;
                "Context cleared.".to_string()
            }
            Incoming::Chat(text) => {
                match self.engine.handle_user_text(REPL_USER_ID, &text).await {
                    Ok(reply) if reply.is_empty() => EMPTY_REPLY.to_string(),
                    Ok(reply) => format!("bot> {reply}"),
                    Err(e) => {
                        error!(error = %e, "Completion failed");
                        SERVICE_UNAVAILABLE.to_string()
                    }
                }
            }
        }
    }
}

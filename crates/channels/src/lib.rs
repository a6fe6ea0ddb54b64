//! Entry surfaces for CtxBot.
//!
//! Thin I/O shells around the chat engine and template runner:
//! - **Telegram** — long-polling Bot API client; updates are handled in
//!   spawned tasks, so one user's in-flight completion never blocks others.
//! - **REPL** — strictly sequential terminal chat under a reserved user id.
//!
//! Both map gateway failures to the same generic "service unavailable"
//! message and never let a single failed turn end the loop.

pub mod repl;
pub mod telegram;

pub use repl::ChatRepl;
pub use telegram::{TelegramBot, TelegramConfig};

/// Incoming text, decoded into the action a surface should take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// `/start` — greet and explain the commands.
    Start,
    /// `/templates` — list the template catalog.
    ListTemplates,
    /// `/run <id>` — run a template.
    RunTemplate(u32),
    /// The context-clear phrase.
    Clear,
    /// Anything else: a chat turn.
    Chat(String),
}

/// Classify one incoming text message. Shared by both surfaces so the
/// command set stays identical.
pub fn classify(text: &str) -> Incoming {
    let trimmed = text.trim();

    if trimmed.eq_ignore_ascii_case("/start") {
        return Incoming::Start;
    }
    if trimmed.eq_ignore_ascii_case("/templates") || trimmed.eq_ignore_ascii_case("templates") {
        return Incoming::ListTemplates;
    }
    if let Some(rest) = trimmed
        .strip_prefix("/run")
        .or_else(|| trimmed.strip_prefix("run "))
    {
        if let Ok(id) = rest.trim().parse::<u32>() {
            return Incoming::RunTemplate(id);
        }
    }
    if ctxbot_agent::is_clear_phrase(trimmed) {
        return Incoming::Clear;
    }

    Incoming::Chat(trimmed.to_string())
}

/// Shown when the completion service rejects a turn.
pub const SERVICE_UNAVAILABLE: &str =
    "The assistant is unavailable right now. Try again later, or send \"очистить контекст\" to reset the conversation.";

/// Shown when the model returns an empty reply.
pub const EMPTY_REPLY: &str =
    "The model returned an empty reply. Try rephrasing, or send \"очистить контекст\".";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_commands() {
        assert_eq!(classify("/start"), Incoming::Start);
        assert_eq!(classify("/templates"), Incoming::ListTemplates);
        assert_eq!(classify("templates"), Incoming::ListTemplates);
        assert_eq!(classify("/run 2"), Incoming::RunTemplate(2));
        assert_eq!(classify("run 13"), Incoming::RunTemplate(13));
    }

    #[test]
    fn classify_clear_phrase_any_case() {
        assert_eq!(classify("очистить контекст"), Incoming::Clear);
        assert_eq!(classify("ОЧИСТИТЬ КОНТЕКСТ"), Incoming::Clear);
    }

    #[test]
    fn classify_chat_fallthrough() {
        assert_eq!(classify(" hello "), Incoming::Chat("hello".into()));
        // a bare number is a chat message, not a template choice
        assert_eq!(classify("42"), Incoming::Chat("42".into()));
        // malformed run command falls through to chat
        assert_eq!(classify("/run abc"), Incoming::Chat("/run abc".into()));
    }
}

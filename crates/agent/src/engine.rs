//! Chat turn orchestration.

use ctxbot_context::{ContextStore, UserId, trim};
use ctxbot_core::error::ProviderError;
use ctxbot_core::message::Message;
use ctxbot_providers::{CompletionGateway, CompletionOptions};
use std::sync::Arc;
use tracing::{info, warn};

/// Message users send to reset their conversation context.
pub const CLEAR_PHRASE: &str = "очистить контекст";

/// Whether `text` is the context-clear phrase, in any letter case.
pub fn is_clear_phrase(text: &str) -> bool {
    text.trim().to_lowercase() == CLEAR_PHRASE
}

/// Drives one conversation turn: history in, reply out.
pub struct ChatEngine {
    store: Arc<ContextStore>,
    gateway: Arc<CompletionGateway>,
    max_context_messages: usize,
}

impl ChatEngine {
    pub fn new(
        store: Arc<ContextStore>,
        gateway: Arc<CompletionGateway>,
        max_context_messages: usize,
    ) -> Self {
        Self {
            store,
            gateway,
            max_context_messages,
        }
    }

    /// Handle one chat turn for `user_id` and return the reply text.
    ///
    /// The stored history is only mutated after a successful, non-empty
    /// reply: on a gateway failure nothing is committed, and an empty reply
    /// is returned as-is without being added to the context (the surface
    /// decides what to show).
    pub async fn handle_user_text(
        &self,
        user_id: UserId,
        text: &str,
    ) -> Result<String, ProviderError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }

        let history = self.store.get(user_id).await;
        let mut messages = trim(&history, self.max_context_messages).to_vec();
        messages.push(Message::user(text));

        let completion = self
            .gateway
            .complete(messages, CompletionOptions::default())
            .await?;

        info!(
            user_id,
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            total_tokens = completion.usage.total_tokens,
            "Turn completed"
        );

        if completion.text.is_empty() {
            warn!(user_id, "Model returned an empty reply, not committing turn");
            return Ok(completion.text);
        }

        self.store
            .append(
                user_id,
                Message::user(text),
                Message::assistant(completion.text.clone()),
            )
            .await;

        Ok(completion.text)
    }

    /// Forget everything stored for `user_id`.
    pub async fn clear_history(&self, user_id: UserId) {
        self.store.clear(user_id).await;
    }

    /// Snapshot of the stored history (for surfaces that display it).
    pub async fn history(&self, user_id: UserId) -> Vec<Message> {
        self.store.get(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxbot_core::error::ProviderError;
    use ctxbot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
    use ctxbot_core::Role;
    use ctxbot_providers::GatewayDefaults;
    use ctxbot_telemetry::UsageLog;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted")
        }
    }

    fn reply(text: &str) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 3,
                completion_tokens: 2,
                total_tokens: 5,
            }),
            model: "gpt-4o-mini".into(),
        })
    }

    fn engine_with(
        dir: &tempfile::TempDir,
        script: Vec<Result<ProviderResponse, ProviderError>>,
        max_context_messages: usize,
    ) -> (ChatEngine, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(script));
        let gateway = Arc::new(CompletionGateway::new(
            Arc::clone(&provider) as Arc<dyn Provider>,
            UsageLog::new(dir.path().join("usage.csv")),
            GatewayDefaults {
                model: "gpt-4o-mini".into(),
                temperature: 0.2,
                max_tokens: 1024,
                system_message: String::new(),
            },
        ));
        let engine = ChatEngine::new(Arc::new(ContextStore::new()), gateway, max_context_messages);
        (engine, provider)
    }

    #[tokio::test]
    async fn turn_commits_user_and_assistant_pair() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _provider) = engine_with(&dir, vec![reply("Hello!")], 20);

        let out = engine.handle_user_text(7, "hello").await.unwrap();
        assert_eq!(out, "Hello!");

        let history = engine.history(7).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Message::user("hello"));
        assert_eq!(history[1], Message::assistant("Hello!"));
    }

    #[tokio::test]
    async fn history_is_sent_trimmed_with_new_turn_last() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, provider) = engine_with(
            &dir,
            vec![reply("1"), reply("2"), reply("3"), reply("4")],
            4,
        );

        for text in ["a", "b", "c", "d"] {
            engine.handle_user_text(1, text).await.unwrap();
        }

        // fourth request: 6 stored messages trimmed to the last 4, plus the
        // new turn — the oldest pair ("a"/"1") is gone
        let requests = provider.requests.lock().unwrap();
        let last = &requests[3].messages;
        assert_eq!(last.len(), 5);
        assert_eq!(last[0], Message::user("b"));
        assert_eq!(last[3], Message::assistant("3"));
        assert_eq!(last[4], Message::user("d"));
    }

    #[tokio::test]
    async fn gateway_failure_leaves_context_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _provider) = engine_with(
            &dir,
            vec![Err(ProviderError::Network("down".into()))],
            20,
        );

        let result = engine.handle_user_text(1, "hello").await;
        assert!(result.is_err());
        assert!(engine.history(1).await.is_empty());
    }

    #[tokio::test]
    async fn empty_reply_is_not_committed() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _provider) = engine_with(&dir, vec![reply("   ")], 20);

        let out = engine.handle_user_text(1, "hello").await.unwrap();
        assert!(out.is_empty());
        assert!(engine.history(1).await.is_empty());
    }

    #[tokio::test]
    async fn blank_input_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, provider) = engine_with(&dir, vec![], 20);

        let out = engine.handle_user_text(1, "   ").await.unwrap();
        assert!(out.is_empty());
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_history_forgets_the_user() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _provider) = engine_with(&dir, vec![reply("hi")], 20);

        engine.handle_user_text(7, "hello").await.unwrap();
        assert_eq!(engine.history(7).await.len(), 2);

        engine.clear_history(7).await;
        assert!(engine.history(7).await.is_empty());
    }

    #[test]
    fn clear_phrase_matches_case_insensitively() {
        assert!(is_clear_phrase("очистить контекст"));
        assert!(is_clear_phrase("ОЧИСТИТЬ КОНТЕКСТ"));
        assert!(is_clear_phrase("  Очистить Контекст  "));
        assert!(!is_clear_phrase("очистить"));
        assert!(!is_clear_phrase("clear context"));
    }

    #[tokio::test]
    async fn users_do_not_share_context() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, provider) = engine_with(&dir, vec![reply("one"), reply("two")], 20);

        engine.handle_user_text(1, "from one").await.unwrap();
        engine.handle_user_text(2, "from two").await.unwrap();

        // second request carries no history from user 1
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].messages, vec![Message::user("from two")]);
        drop(requests);

        assert_eq!(engine.history(1).await[1].role, Role::Assistant);
        assert_eq!(engine.history(2).await[0].content, "from two");
    }
}

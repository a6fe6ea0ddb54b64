//! End-to-end flows through the full stack: classification, chat engine,
//! completion gateway, template runner, and the on-disk logs — with a
//! scripted provider standing in for the model service.

use async_trait::async_trait;
use ctxbot_agent::ChatEngine;
use ctxbot_channels::{classify, Incoming};
use ctxbot_context::ContextStore;
use ctxbot_core::error::ProviderError;
use ctxbot_core::message::Message;
use ctxbot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use ctxbot_providers::{CompletionGateway, GatewayDefaults};
use ctxbot_telemetry::UsageLog;
use ctxbot_templates::{PromptCatalog, TemplateRunner};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
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
            prompt_tokens: 12,
            completion_tokens: 6,
            total_tokens: 18,
        }),
        model: "gpt-4o-mini".into(),
    })
}

struct Stack {
    engine: ChatEngine,
    runner: TemplateRunner,
    dir: tempfile::TempDir,
}

fn stack(script: Vec<Result<ProviderResponse, ProviderError>>) -> Stack {
    let dir = tempfile::tempdir().unwrap();

    let catalog_path = dir.path().join("prompts.json");
    std::fs::write(
        &catalog_path,
        r#"{
            "task": "structured answers",
            "prompts": [
                {
                    "id": 1,
                    "name": "facts",
                    "role": "You are precise.",
                    "question": "Three facts, please.",
                    "format": "Reply with a JSON object."
                }
            ]
        }"#,
    )
    .unwrap();
    let catalog = PromptCatalog::load(&catalog_path).unwrap();

    let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::new(script));
    let gateway = Arc::new(CompletionGateway::new(
        provider,
        UsageLog::new(dir.path().join("usage.csv")),
        GatewayDefaults {
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            max_tokens: 1024,
            system_message: String::new(),
        },
    ));

    let engine = ChatEngine::new(Arc::new(ContextStore::new()), Arc::clone(&gateway), 20);
    let runner = TemplateRunner::new(catalog, gateway, dir.path().join("template_results.json"));

    Stack {
        engine,
        runner,
        dir,
    }
}

#[tokio::test]
async fn chat_turn_commits_history_and_clear_phrase_resets_it() {
    let stack = stack(vec![reply("Hi! How can I help?")]);

    let Incoming::Chat(text) = classify("hello") else {
        panic!("plain text should classify as chat");
    };
    let out = stack.engine.handle_user_text(7, &text).await.unwrap();
    assert!(!out.is_empty());

    let history = stack.engine.history(7).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], Message::user("hello"));
    assert_eq!(history[1], Message::assistant("Hi! How can I help?"));

    // clear phrase works in any letter case
    assert_eq!(classify("ОЧИСТИТЬ КОНТЕКСТ"), Incoming::Clear);
    stack.engine.clear_history(7).await;
    assert!(stack.engine.history(7).await.is_empty());
}

#[tokio::test]
async fn consecutive_turns_build_on_each_other_per_user() {
    let stack = stack(vec![reply("one"), reply("two"), reply("other user")]);

    stack.engine.handle_user_text(7, "first").await.unwrap();
    stack.engine.handle_user_text(7, "second").await.unwrap();
    stack.engine.handle_user_text(8, "unrelated").await.unwrap();

    let history = stack.engine.history(7).await;
    assert_eq!(history.len(), 4);
    assert_eq!(history[2], Message::user("second"));
    assert_eq!(history[3], Message::assistant("two"));

    assert_eq!(stack.engine.history(8).await.len(), 2);
}

#[tokio::test]
async fn template_run_persists_results_without_touching_chat_context() {
    let stack = stack(vec![reply("chat reply"), reply(r#"{"facts": ["a"]}"#)]);

    stack.engine.handle_user_text(7, "hello").await.unwrap();

    let Incoming::RunTemplate(id) = classify("/run 1") else {
        panic!("/run 1 should classify as a template run");
    };
    let outcome = stack.runner.run(id).await.unwrap();
    assert!(outcome.parsed);
    assert_eq!(outcome.result, serde_json::json!({"facts": ["a"]}));

    // the results document exists and the chat history is unchanged
    assert!(stack.dir.path().join("template_results.json").exists());
    assert_eq!(stack.engine.history(7).await.len(), 2);
}

#[tokio::test]
async fn both_call_paths_share_one_usage_log() {
    let stack = stack(vec![reply("chat reply"), reply(r#"{"ok": true}"#)]);

    stack.engine.handle_user_text(7, "hello").await.unwrap();
    stack.runner.run(1).await.unwrap();

    let log = std::fs::read_to_string(stack.dir.path().join("usage.csv")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 3); // header + chat turn + template run
    assert!(lines[0].starts_with("run_id,"));
    assert!(lines[1].starts_with("1,"));
    assert!(lines[2].starts_with("2,"));
}

#[tokio::test]
async fn failed_turn_leaves_no_trace() {
    let stack = stack(vec![Err(ProviderError::Network("down".into()))]);

    let result = stack.engine.handle_user_text(7, "hello").await;
    assert!(result.is_err());
    assert!(stack.engine.history(7).await.is_empty());
    assert!(!stack.dir.path().join("usage.csv").exists());
}

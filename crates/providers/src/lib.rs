//! LLM provider implementations and the completion gateway for CtxBot.
//!
//! [`OpenAiProvider`] speaks the OpenAI `/v1/chat/completions` wire format
//! and classifies rejections into typed errors. [`CompletionGateway`] sits
//! on top of any [`ctxbot_core::Provider`]: it resolves configured
//! defaults, prepends the system message, retries once when the model
//! rejects the temperature override, and records token usage.

pub mod gateway;
pub mod openai;

pub use gateway::{Completion, CompletionGateway, CompletionOptions, GatewayDefaults};
pub use openai::OpenAiProvider;

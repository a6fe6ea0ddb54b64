//! # CtxBot Core
//!
//! Domain types, traits, and error definitions for the CtxBot assistant.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! The one trait seam is [`Provider`]: the completion gateway, the chat
//! engine, and the template runner all work against `dyn Provider`, so
//! tests can swap in scripted backends.

pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{ChannelError, Error, ProviderError, Result, TemplateError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};

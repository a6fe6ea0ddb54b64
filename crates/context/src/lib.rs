//! Conversation context for CtxBot.
//!
//! - [`ContextStore`] — memory-resident per-user message history
//!   (append in user/assistant pairs, snapshot reads, explicit clear).
//! - [`trim`] — pure suffix truncation bounding the history sent to the
//!   completion service.
//!
//! History is not durable: it lives for the process lifetime only.

pub mod store;
pub mod trim;

pub use store::{ContextStore, UserId};
pub use trim::trim;

//! The conversation engine — one turn at a time.
//!
//! Both entry surfaces (Telegram bot and terminal REPL) drive the same two
//! operations: [`ChatEngine::handle_user_text`] for a chat turn and
//! [`ChatEngine::clear_history`] to reset a user's context. The engine owns
//! the flow: snapshot history → trim → append the new user turn → gateway
//! → commit the completed turn.

pub mod engine;

pub use engine::{ChatEngine, CLEAR_PHRASE, is_clear_phrase};

//! Prompt templates for CtxBot.
//!
//! A catalog document defines named one-shot prompts (role, context,
//! question, format, example). The [`TemplateRunner`] renders a chosen
//! template into a system/user pair, runs it through the completion
//! gateway, validates the reply as JSON, and persists the outcome —
//! including parse failures — to a results document.
//!
//! Template runs are stateless: they never touch the conversation context.

pub mod catalog;
pub mod runner;

pub use catalog::{PromptCatalog, PromptTemplate};
pub use runner::{TemplateOutcome, TemplateRunRecord, TemplateRunner};

//! In-memory per-user conversation history.
//!
//! The store is an explicitly owned handle (no globals): create one at
//! startup and share it behind an `Arc`. All operations are total — there
//! are no error conditions.
//!
//! Concurrency: the map is guarded by an `RwLock`, so concurrent access is
//! data-race free and different users never interfere. Two in-flight turns
//! for the *same* user can still interleave at turn granularity (both read
//! the same snapshot, both append); surfaces are expected to be low-volume
//! enough for that to be acceptable.

use ctxbot_core::Message;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Opaque user identifier supplied by an entry surface.
pub type UserId = i64;

/// Memory-resident conversation histories, keyed by user id.
pub struct ContextStore {
    histories: RwLock<HashMap<UserId, Vec<Message>>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of the stored history for `user_id`, empty if none exists.
    ///
    /// The returned vector is a copy; mutating it never affects stored state.
    pub async fn get(&self, user_id: UserId) -> Vec<Message> {
        self.histories
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append one completed turn (user message + assistant reply) to the
    /// history for `user_id`, creating it if absent.
    ///
    /// No trimming happens here; bounding the history is the caller's job
    /// when it builds a completion request.
    pub async fn append(&self, user_id: UserId, user_message: Message, assistant_message: Message) {
        let mut histories = self.histories.write().await;
        let history = histories.entry(user_id).or_default();
        history.push(user_message);
        history.push(assistant_message);
        debug!(user_id, messages = history.len(), "Context updated");
    }

    /// Remove the entire history for `user_id`. No-op if none exists.
    pub async fn clear(&self, user_id: UserId) {
        if self.histories.write().await.remove(&user_id).is_some() {
            info!(user_id, "Context cleared");
        }
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

//! History trimming.

use ctxbot_core::Message;

/// Bound a history to its most recent `max_messages` entries.
///
/// Returns the input unchanged when it already fits, otherwise the suffix —
/// oldest turns are dropped first. Pure and deterministic.
///
/// The limit is a message count, not a token count: it bounds request size
/// and latency, but the actual token footprint still varies with message
/// length.
pub fn trim(messages: &[Message], max_messages: usize) -> &[Message] {
    if messages.len() <= max_messages {
        messages
    } else {
        &messages[messages.len() - max_messages..]
    }
}

//! Rebuilds chat history from platform contexts.
//!
//! The platform may hold several contexts at once, most of them unrelated to
//! us. Each one is scanned for the two keys we write and everything else is
//! ignored, so new platform-side contexts never break a turn.

use dialogbridge_core::fulfillment::ContextEntry;
use dialogbridge_core::message::Message;

/// Turn the platform's contexts (oldest first) into an ordered history.
///
/// Per entry, `lastAIResponse` yields an assistant message and then
/// `lastUserQuery` yields a user message. Either may be missing on its own.
pub fn reconstruct_history(contexts: &[ContextEntry]) -> Vec<Message> {
    let mut history = Vec::new();

    for entry in contexts {
        let params = &entry.parameters;
        if let Some(reply) = &params.last_ai_response {
            history.push(Message::assistant(reply.as_str()));
        }
        if let Some(query) = &params.last_user_query {
            history.push(Message::user(query.as_str()));
        }
    }

    history
}

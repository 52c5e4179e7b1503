//! Port for structured transcript logging.
//!
//! Defines the [`ConversationLogger`] trait for recording every transcript
//! mutation (prompts, user turns, replies, injections, compactions) to a
//! machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures what the assistant
//! actually saw and said.

use orca_domain::{Message, ParticipantId};
use serde_json::{Value, json};

/// A structured transcript event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "user_message", "assistant_reply").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// A message that entered the transcript, tagged with who caused it.
    pub fn message(
        event_type: &'static str,
        message: &Message,
        participant: Option<&ParticipantId>,
    ) -> Self {
        let mut payload = json!({
            "role": message.role,
            "content": message.content,
        });
        if let Some(id) = participant {
            payload["participant"] = json!(id);
        }
        Self::new(event_type, payload)
    }
}

/// Port for logging transcript events.
///
/// `log` is synchronous and infallible so that a broken log file can never
/// stall or fail an event handler.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_event_payload() {
        let event = ConversationEvent::message(
            "user_message",
            &Message::user("hello"),
            Some(&ParticipantId::new("c1")),
        );
        assert_eq!(event.event_type, "user_message");
        assert_eq!(
            event.payload,
            json!({"role": "user", "content": "hello", "participant": "c1"})
        );
    }

    #[test]
    fn test_message_event_without_participant() {
        let event = ConversationEvent::message("assistant_reply", &Message::assistant("hi"), None);
        assert!(event.payload.get("participant").is_none());
    }
}

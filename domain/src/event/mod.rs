//! Orchestration events.
//!
//! An [`OrchestrationEvent`] carries only the data one state transition
//! needs. Events are created by producers (connections, timers, tool
//! runners), queued on the event bus, processed once, and dropped.

use crate::conversation::entities::Role;
use crate::participant::{Participant, ParticipantId};
use std::fmt;

/// Closed set of state transitions the orchestrator understands.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestrationEvent {
    /// A participant connected.
    ClientConnected { participant: Participant },

    /// A participant went away.
    ClientDisconnected { participant_id: ParticipantId },

    /// A participant said something; the assistant answers.
    ClientMessage {
        participant_id: ParticipantId,
        text: String,
    },

    /// A participant sent base64 audio; it is transcribed, then handled like
    /// a [`ClientMessage`](Self::ClientMessage).
    ClientAudio {
        participant_id: ParticipantId,
        audio_base64: String,
    },

    /// A participant places a message into the transcript without asking
    /// for a reply. `system` messages need a privileged sender.
    MessageInjected {
        sender: ParticipantId,
        role: Role,
        text: String,
    },

    /// A function/tool call finished and its output is folded into the
    /// transcript.
    FunctionReturned { name: String, output: String },

    /// Timer-driven generation with no new input.
    SpontaneousGeneration,

    /// Refresh the system prompt and compact the transcript.
    RebuildPrompt,
}

impl OrchestrationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            OrchestrationEvent::ClientConnected { .. } => EventKind::ClientConnected,
            OrchestrationEvent::ClientDisconnected { .. } => EventKind::ClientDisconnected,
            OrchestrationEvent::ClientMessage { .. } => EventKind::ClientMessage,
            OrchestrationEvent::ClientAudio { .. } => EventKind::ClientAudio,
            OrchestrationEvent::MessageInjected { .. } => EventKind::MessageInjected,
            OrchestrationEvent::FunctionReturned { .. } => EventKind::FunctionReturned,
            OrchestrationEvent::SpontaneousGeneration => EventKind::SpontaneousGeneration,
            OrchestrationEvent::RebuildPrompt => EventKind::RebuildPrompt,
        }
    }

    /// Whether handling this event may call the generation backend.
    pub fn may_generate(&self) -> bool {
        matches!(
            self,
            OrchestrationEvent::ClientMessage { .. }
                | OrchestrationEvent::ClientAudio { .. }
                | OrchestrationEvent::FunctionReturned { .. }
                | OrchestrationEvent::SpontaneousGeneration
        )
    }
}

/// Payload-free tag of an [`OrchestrationEvent`], for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ClientConnected,
    ClientDisconnected,
    ClientMessage,
    ClientAudio,
    MessageInjected,
    FunctionReturned,
    SpontaneousGeneration,
    RebuildPrompt,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ClientConnected => "client_connected",
            EventKind::ClientDisconnected => "client_disconnected",
            EventKind::ClientMessage => "client_message",
            EventKind::ClientAudio => "client_audio",
            EventKind::MessageInjected => "message_injected",
            EventKind::FunctionReturned => "function_returned",
            EventKind::SpontaneousGeneration => "spontaneous_generation",
            EventKind::RebuildPrompt => "rebuild_prompt",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

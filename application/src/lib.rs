//! Application layer for orca
//!
//! This crate contains the event bus, the event handlers, the orchestrator
//! lifecycle and the port definitions the infrastructure layer implements.
//! It depends only on the domain layer.

pub mod config;
pub mod events;
pub mod orchestrator;
pub mod ports;
pub mod replacements;
pub mod state;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::ConversationParams;
pub use events::{BusStats, DispatchOutcome, EventBus, EventError, EventPublisher, PublishError};
pub use orchestrator::{Orchestrator, OrchestratorError, Phase, spontaneous::SpontaneousTimer};
pub use ports::{
    backend::{
        BackendError, BackendLauncher, FragmentStream, GenerationBackend, ManagedBackend,
        TranscriptionBackend,
    },
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    reply_notifier::{NoReplyNotifier, ReplyNotifier},
};
pub use replacements::{ReplacementSource, current_replacements, replacements_at};
pub use state::OrchestrationState;
pub use use_cases::generate_reply::{ReplyOutcome, generate_reply};
pub use use_cases::process_event::ProcessEvent;

//! Domain layer for orca
//!
//! This crate contains the core conversation model and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Context
//!
//! The ordered transcript sent to the generation backend. When a system
//! prompt is configured it always sits at index 0.
//!
//! ## Events
//!
//! Every state mutation is described by an [`OrchestrationEvent`] and
//! executed one at a time by the application layer's event bus.

pub mod conversation;
pub mod core;
pub mod event;
pub mod hyperparameters;
pub mod participant;

// Re-export commonly used types
pub use conversation::{
    context::{CompactionPolicy, Context},
    entities::{Message, Role},
    template::{DATE_TOKEN, PromptReplacements, SystemPromptTemplate, TIME_TOKEN},
};
pub use core::{error::DomainError, text::preview};
pub use event::{EventKind, OrchestrationEvent};
pub use hyperparameters::{
    generation::GenerationHyperparameters, transcription::TranscriptionHyperparameters,
};
pub use participant::{Participant, ParticipantId};

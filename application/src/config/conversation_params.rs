//! Conversation parameters: what the event handlers need to know.
//!
//! [`ConversationParams`] groups the static settings the orchestrator hands
//! to its event handlers: the system-prompt template, per-request
//! hyperparameters, the compaction budget, the spontaneous-generation timer
//! and the privileged participant names.

use orca_domain::{
    CompactionPolicy, GenerationHyperparameters, SystemPromptTemplate,
    TranscriptionHyperparameters,
};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ConversationParams {
    /// Raw system prompt; empty means no system message.
    pub system_prompt: SystemPromptTemplate,
    /// Sampling controls reused for every generation.
    pub generation: GenerationHyperparameters,
    /// Decoding controls reused for every transcription.
    pub transcription: TranscriptionHyperparameters,
    /// Applied by the rebuild-prompt pass.
    pub compaction: CompactionPolicy,
    /// Idle time after which a spontaneous generation is queued.
    /// `None` disables the timer.
    pub spontaneous_after: Option<Duration>,
    /// Participant names that may inject `system` messages.
    pub privileged_names: Vec<String>,
}

impl ConversationParams {
    // ==================== Builder Methods ====================

    pub fn with_system_prompt(mut self, template: impl Into<SystemPromptTemplate>) -> Self {
        self.system_prompt = template.into();
        self
    }

    pub fn with_generation(mut self, hyperparameters: GenerationHyperparameters) -> Self {
        self.generation = hyperparameters;
        self
    }

    pub fn with_transcription(mut self, hyperparameters: TranscriptionHyperparameters) -> Self {
        self.transcription = hyperparameters;
        self
    }

    pub fn with_compaction(mut self, policy: CompactionPolicy) -> Self {
        self.compaction = policy;
        self
    }

    pub fn with_spontaneous_after(mut self, idle: Duration) -> Self {
        self.spontaneous_after = Some(idle);
        self
    }

    pub fn with_privileged(mut self, name: impl Into<String>) -> Self {
        self.privileged_names.push(name.into());
        self
    }

    // ==================== Queries ====================

    pub fn is_privileged_name(&self, name: &str) -> bool {
        self.privileged_names.iter().any(|n| n == name)
    }
}

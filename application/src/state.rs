//! Shared orchestration state.
//!
//! [`OrchestrationState`] is everything event handlers read and mutate: the
//! transcript, the two backends, connected participants and the shutdown
//! signal. It is owned by the event-consumption task for as long as the
//! orchestrator runs and lent to one handler at a time, so it needs no
//! locking.

use crate::config::ConversationParams;
use crate::ports::backend::{GenerationBackend, TranscriptionBackend};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::reply_notifier::{NoReplyNotifier, ReplyNotifier};
use crate::replacements::{ReplacementSource, current_replacements};
use orca_domain::{Context, Participant, ParticipantId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct OrchestrationState {
    pub context: Context,
    pub params: ConversationParams,
    generation: Arc<dyn GenerationBackend>,
    transcription: Arc<dyn TranscriptionBackend>,
    participants: HashMap<ParticipantId, Participant>,
    reply_notifier: Arc<dyn ReplyNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
    replacements: ReplacementSource,
    shutdown: CancellationToken,
}

impl OrchestrationState {
    /// Build the state, rendering the system prompt from `params`.
    pub fn new(
        params: ConversationParams,
        generation: Arc<dyn GenerationBackend>,
        transcription: Arc<dyn TranscriptionBackend>,
    ) -> Self {
        let replacements: ReplacementSource = current_replacements;
        let context = Context::new(params.system_prompt.clone(), &replacements());
        Self {
            context,
            params,
            generation,
            transcription,
            participants: HashMap::new(),
            reply_notifier: Arc::new(NoReplyNotifier),
            conversation_logger: Arc::new(NoConversationLogger),
            replacements,
            shutdown: CancellationToken::new(),
        }
    }

    /// Swap the placeholder source and re-render the system prompt with it.
    pub fn with_replacements(mut self, source: ReplacementSource) -> Self {
        self.replacements = source;
        self.context = Context::new(self.params.system_prompt.clone(), &source());
        self
    }

    pub fn with_reply_notifier(mut self, notifier: Arc<dyn ReplyNotifier>) -> Self {
        self.reply_notifier = notifier;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    // ==================== Accessors ====================

    pub fn generation(&self) -> &Arc<dyn GenerationBackend> {
        &self.generation
    }

    pub fn transcription(&self) -> &Arc<dyn TranscriptionBackend> {
        &self.transcription
    }

    pub fn reply_notifier(&self) -> &dyn ReplyNotifier {
        self.reply_notifier.as_ref()
    }

    pub fn log(&self, event: ConversationEvent) {
        self.conversation_logger.log(event);
    }

    /// Fresh placeholder values for a system-prompt rebuild.
    pub fn replacements(&self) -> orca_domain::PromptReplacements {
        (self.replacements)()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    // ==================== Participants ====================

    /// Register a participant, returning the previous registration for the
    /// same id.
    pub fn connect(&mut self, participant: Participant) -> Option<Participant> {
        self.participants.insert(participant.id.clone(), participant)
    }

    pub fn disconnect(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Restore transcript invariants after a handler was cut short.
    pub fn recover(&mut self) {
        if self.context.is_replying() {
            let _ = self.context.finish_reply();
        }
    }
}

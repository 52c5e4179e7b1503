//! Process Event use case.
//!
//! One handler per [`OrchestrationEvent`] variant. Each handler runs with
//! exclusive access to the [`OrchestrationState`]; the event bus guarantees
//! that no two handlers ever overlap.

use crate::events::EventError;
use crate::ports::conversation_logger::ConversationEvent;
use crate::state::OrchestrationState;
use crate::use_cases::generate_reply::{ReplyOutcome, generate_reply};
use async_trait::async_trait;
use orca_domain::{EventKind, Message, OrchestrationEvent, Participant, ParticipantId, Role, preview};
use serde_json::json;
use tracing::{debug, info, warn};

/// Applies one event to the orchestration state.
#[async_trait]
pub trait ProcessEvent: Send {
    async fn process(self, state: &mut OrchestrationState) -> Result<(), EventError>;
}

#[async_trait]
impl ProcessEvent for OrchestrationEvent {
    async fn process(self, state: &mut OrchestrationState) -> Result<(), EventError> {
        let kind = self.kind();
        match self {
            OrchestrationEvent::ClientConnected { participant } => {
                client_connected(state, participant);
                Ok(())
            }
            OrchestrationEvent::ClientDisconnected { participant_id } => {
                client_disconnected(state, &participant_id);
                Ok(())
            }
            OrchestrationEvent::ClientMessage {
                participant_id,
                text,
            } => client_message(state, &participant_id, text, kind).await,
            OrchestrationEvent::ClientAudio {
                participant_id,
                audio_base64,
            } => client_audio(state, &participant_id, &audio_base64).await,
            OrchestrationEvent::MessageInjected { sender, role, text } => {
                message_injected(state, &sender, role, text)
            }
            OrchestrationEvent::FunctionReturned { name, output } => {
                function_returned(state, &name, &output).await
            }
            OrchestrationEvent::SpontaneousGeneration => spontaneous_generation(state).await,
            OrchestrationEvent::RebuildPrompt => {
                rebuild_prompt(state);
                Ok(())
            }
        }
    }
}

fn client_connected(state: &mut OrchestrationState, mut participant: Participant) {
    if state.params.is_privileged_name(&participant.name) {
        participant.privileged = true;
    }
    info!(
        "Participant connected: {} ({}){}",
        participant.name,
        participant.id,
        if participant.privileged { " [privileged]" } else { "" }
    );
    state.log(ConversationEvent::new(
        "participant_joined",
        json!({
            "participant": participant.id,
            "name": participant.name,
            "privileged": participant.privileged,
        }),
    ));
    if let Some(previous) = state.connect(participant) {
        debug!("Replaced earlier registration for {}", previous.id);
    }
}

fn client_disconnected(state: &mut OrchestrationState, id: &ParticipantId) {
    match state.disconnect(id) {
        Some(participant) => {
            info!("Participant disconnected: {} ({})", participant.name, id);
            state.log(ConversationEvent::new(
                "participant_left",
                json!({ "participant": id }),
            ));
        }
        None => warn!("Disconnect for unknown participant {}", id),
    }
}

fn require_participant<'a>(
    state: &'a OrchestrationState,
    id: &ParticipantId,
) -> Result<&'a Participant, EventError> {
    state
        .participant(id)
        .ok_or_else(|| EventError::UnknownParticipant(id.clone()))
}

async fn client_message(
    state: &mut OrchestrationState,
    id: &ParticipantId,
    text: String,
    trigger: EventKind,
) -> Result<(), EventError> {
    require_participant(state, id)?;
    debug!("{}: {}", id, preview(&text, 100));

    let message = Message::user(text);
    state.log(ConversationEvent::message("user_message", &message, Some(id)));
    state.context.append(message.role, message.content);

    generate_reply(state, trigger).await?;
    Ok(())
}

async fn client_audio(
    state: &mut OrchestrationState,
    id: &ParticipantId,
    audio_base64: &str,
) -> Result<(), EventError> {
    require_participant(state, id)?;

    let transcription = state.transcription().clone();
    let text = transcription
        .transcribe(&state.params.transcription, audio_base64)
        .await?;

    if text.is_empty() {
        debug!("Dropping empty transcript from {}", id);
        return Ok(());
    }
    client_message(state, id, text, EventKind::ClientAudio).await
}

fn message_injected(
    state: &mut OrchestrationState,
    sender: &ParticipantId,
    role: Role,
    text: String,
) -> Result<(), EventError> {
    let participant = require_participant(state, sender)?;
    participant.authorize_injection(role)?;

    let message = Message::new(role, text);
    state.log(ConversationEvent::message(
        "injected_message",
        &message,
        Some(sender),
    ));
    state.context.append(message.role, message.content);
    Ok(())
}

async fn function_returned(
    state: &mut OrchestrationState,
    name: &str,
    output: &str,
) -> Result<(), EventError> {
    let message = Message::system(format!("[function:{name}] {output}"));
    debug!("Function {} returned: {}", name, preview(output, 100));
    state.log(ConversationEvent::message("function_return", &message, None));
    state.context.append(message.role, message.content);

    generate_reply(state, EventKind::FunctionReturned).await?;
    Ok(())
}

async fn spontaneous_generation(state: &mut OrchestrationState) -> Result<(), EventError> {
    if state.context.conversation_len() == 0 {
        debug!("Skipping spontaneous generation on an empty conversation");
        return Ok(());
    }
    if let ReplyOutcome::Empty =
        generate_reply(state, EventKind::SpontaneousGeneration).await?
    {
        debug!("Spontaneous generation produced nothing");
    }
    Ok(())
}

fn rebuild_prompt(state: &mut OrchestrationState) {
    let replacements = state.replacements();
    if state.context.rebuild_system_prompt(&replacements) {
        if let Some(system) = state.context.system_message() {
            state.log(ConversationEvent::message("system_prompt", system, None));
        }
    }

    let before = state.context.len();
    let dropped = state.params.compaction.apply(&mut state.context);
    if dropped > 0 {
        info!(
            "Compacted transcript: {} -> {} messages",
            before,
            state.context.len()
        );
        state.log(ConversationEvent::new(
            "compaction",
            json!({ "before": before, "after": state.context.len(), "dropped": dropped }),
        ));
    }
}

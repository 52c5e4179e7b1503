//! Generate Reply use case.
//!
//! Streams one assistant reply into the transcript. The reply message is
//! opened before the request goes out and every fragment is folded into it
//! as it arrives, so a reader of the context always sees the partial reply.

use crate::ports::backend::BackendError;
use crate::ports::conversation_logger::ConversationEvent;
use crate::state::OrchestrationState;
use futures::StreamExt;
use orca_domain::{EventKind, Message, preview};
use tracing::{debug, info, warn};

/// Outcome of a generation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The reply was stored; carries its full text.
    Completed(String),
    /// The server produced no text; nothing was stored.
    Empty,
    /// Shutdown was requested while streaming; the partial reply was kept.
    Interrupted(String),
}

/// Generate an assistant reply from the current transcript.
///
/// On a backend error the partial reply (if any) stays in the transcript and
/// the error is returned to the caller.
pub async fn generate_reply(
    state: &mut OrchestrationState,
    trigger: EventKind,
) -> Result<ReplyOutcome, BackendError> {
    let generation = state.generation().clone();
    debug!(
        "Generating reply ({trigger}) over {} messages",
        state.context.len()
    );

    let mut stream = generation
        .generate(state.context.prompt(), &state.params.generation)
        .await
        .inspect_err(|e| state.reply_notifier().on_reply_failed(&e.to_string()))?;

    state.reply_notifier().on_reply_start(trigger);
    state.context.begin_reply();

    let mut interrupted = false;
    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                state.context.extend_reply(&fragment);
                state.reply_notifier().on_fragment(&fragment);
            }
            Err(e) => {
                warn!("Generation stream failed: {}", e);
                if let Some(partial) = state.context.finish_reply() {
                    log_reply(state, &partial);
                }
                state.reply_notifier().on_reply_failed(&e.to_string());
                return Err(e);
            }
        }
        if state.is_shutting_down() {
            interrupted = true;
            break;
        }
    }

    let outcome = match state.context.finish_reply() {
        Some(text) if interrupted => ReplyOutcome::Interrupted(text),
        Some(text) => ReplyOutcome::Completed(text),
        None => ReplyOutcome::Empty,
    };

    match &outcome {
        ReplyOutcome::Completed(text) | ReplyOutcome::Interrupted(text) => {
            info!("Assistant: {}", preview(text, 100));
            log_reply(state, text);
            state.reply_notifier().on_reply_complete(text);
        }
        ReplyOutcome::Empty => debug!("Generation produced no text"),
    }
    Ok(outcome)
}

fn log_reply(state: &OrchestrationState, text: &str) {
    state.log(ConversationEvent::message(
        "assistant_reply",
        &Message::assistant(text),
        None,
    ));
}

//! Reply notifier port
//!
//! Lets whoever is attached to the orchestrator (console, network layer)
//! see assistant replies while they stream into the transcript.

use orca_domain::EventKind;

/// Callbacks for streamed assistant replies.
///
/// Called from the event-consumption task, so implementations must return
/// quickly; a slow notifier delays every queued event.
pub trait ReplyNotifier: Send + Sync {
    /// A generation started because of `trigger`.
    fn on_reply_start(&self, _trigger: EventKind) {}

    /// One fragment arrived from the generation backend.
    fn on_fragment(&self, fragment: &str);

    /// The reply finished; `text` is the full reply as stored.
    fn on_reply_complete(&self, _text: &str) {}

    /// The reply was cut short by a backend error.
    fn on_reply_failed(&self, _error: &str) {}
}

/// No-op implementation for when nothing is attached.
pub struct NoReplyNotifier;

impl ReplyNotifier for NoReplyNotifier {
    fn on_fragment(&self, _fragment: &str) {}
}

//! Inference backend ports
//!
//! Defines the contracts for the two local inference servers the orchestrator
//! supervises. Each adapter owns exactly one server process; the application
//! layer only sees typed request/response calls plus `close`.

use async_trait::async_trait;
use futures::Stream;
use orca_domain::{GenerationHyperparameters, Message, TranscriptionHyperparameters};
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while launching or talking to a backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to launch {backend} backend: {message}")]
    Launch {
        backend: &'static str,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    #[error("Failed to terminate {backend} backend: {message}")]
    Terminate {
        backend: &'static str,
        message: String,
    },
}

impl BackendError {
    /// Whether the request never reached a working server.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport(_))
    }
}

/// Lazy, single-pass sequence of generated text fragments.
///
/// The stream is not restartable; dropping it abandons the HTTP response.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

/// Lifecycle shared by every supervised backend.
#[async_trait]
pub trait ManagedBackend: Send + Sync {
    /// Short name used in logs (`"llm"`, `"stt"`).
    fn name(&self) -> &str;

    /// URL requests are posted to.
    fn endpoint(&self) -> &str;

    /// Request graceful termination of the server process and wait for it
    /// to exit. Calling this more than once is a no-op.
    async fn close(&self) -> Result<(), BackendError>;
}

/// Text-generation backend (chat completions).
#[async_trait]
pub trait GenerationBackend: ManagedBackend {
    /// Start a streaming generation over `messages`.
    ///
    /// Returns once the response headers arrived; fragments are pulled from
    /// the returned stream as the server produces them.
    async fn generate(
        &self,
        messages: &[Message],
        hyperparameters: &GenerationHyperparameters,
    ) -> Result<FragmentStream, BackendError>;
}

/// Speech-to-text backend.
#[async_trait]
pub trait TranscriptionBackend: ManagedBackend {
    /// Transcribe base64-encoded audio, returning trimmed text.
    async fn transcribe(
        &self,
        hyperparameters: &TranscriptionHyperparameters,
        audio_base64: &str,
    ) -> Result<String, BackendError>;
}

/// Factory the orchestrator uses to spawn its backends at start.
///
/// Opening must not wait for the server to accept requests; readiness is
/// probed by whoever sends the first request.
#[async_trait]
pub trait BackendLauncher: Send + Sync {
    async fn open_generation(&self) -> Result<Arc<dyn GenerationBackend>, BackendError>;

    async fn open_transcription(&self) -> Result<Arc<dyn TranscriptionBackend>, BackendError>;
}

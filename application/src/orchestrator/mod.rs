//! Orchestrator lifecycle.
//!
//! The [`Orchestrator`] owns both backends, the event bus and the
//! consumption task:
//!
//! ```text
//! Created ──start()──▶ Running ──shutdown──▶ ShuttingDown ──stop()──▶ Stopped
//! ```
//!
//! [`run`](Orchestrator::run) composes the three and always stops on the way
//! out. Dropping a running orchestrator cancels its tasks; backend processes
//! are then reclaimed by their own drop handlers.

pub mod spontaneous;

use crate::config::ConversationParams;
use crate::events::{EventBus, EventPublisher};
use crate::ports::backend::{
    BackendError, BackendLauncher, GenerationBackend, ManagedBackend, TranscriptionBackend,
};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::reply_notifier::{NoReplyNotifier, ReplyNotifier};
use crate::replacements::{ReplacementSource, current_replacements};
use crate::state::OrchestrationState;
use orca_domain::Context;
use spontaneous::SpontaneousTimer;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long `stop` waits for an in-flight event before abandoning it.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Orchestrator already started")]
    AlreadyStarted,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Running,
    ShuttingDown,
    Stopped,
}

type EventLoop = JoinHandle<(EventBus, OrchestrationState)>;

pub struct Orchestrator {
    launcher: Arc<dyn BackendLauncher>,
    params: ConversationParams,
    phase: Phase,
    bus: Option<EventBus>,
    publisher: EventPublisher,
    shutdown: CancellationToken,
    generation: Option<Arc<dyn GenerationBackend>>,
    transcription: Option<Arc<dyn TranscriptionBackend>>,
    event_loop: Option<EventLoop>,
    timer: Option<JoinHandle<()>>,
    finished: Option<OrchestrationState>,
    reply_notifier: Arc<dyn ReplyNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
    replacements: ReplacementSource,
    drain_timeout: Duration,
}

impl Orchestrator {
    pub fn new(launcher: Arc<dyn BackendLauncher>, params: ConversationParams) -> Self {
        let bus = EventBus::unbounded();
        Self {
            launcher,
            params,
            phase: Phase::Created,
            publisher: bus.publisher(),
            bus: Some(bus),
            shutdown: CancellationToken::new(),
            generation: None,
            transcription: None,
            event_loop: None,
            timer: None,
            finished: None,
            reply_notifier: Arc::new(NoReplyNotifier),
            conversation_logger: Arc::new(NoConversationLogger),
            replacements: current_replacements,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    // ==================== Builder Methods ====================

    /// Replace the default unbounded bus. Publishers handed out earlier keep
    /// pointing at the old one.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.publisher = bus.publisher();
        self.bus = Some(bus);
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

    pub fn with_replacements(mut self, source: ReplacementSource) -> Self {
        self.replacements = source;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    // ==================== Accessors ====================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handle for producers. Events published before `start` are queued.
    pub fn publisher(&self) -> EventPublisher {
        self.publisher.clone()
    }

    /// Cancelling this token moves a running orchestrator to ShuttingDown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The transcript as it was when the event loop stopped.
    pub fn final_context(&self) -> Option<&Context> {
        self.finished.as_ref().map(|state| &state.context)
    }

    // ==================== Lifecycle ====================

    /// Open both backends and start consuming events.
    ///
    /// Each backend is kept as soon as it opens, so a failure part-way
    /// leaves the ones already running for [`stop`](Self::stop) to close.
    pub async fn start(&mut self) -> Result<(), OrchestratorError> {
        if self.phase != Phase::Created {
            return Err(OrchestratorError::AlreadyStarted);
        }
        let Some(mut bus) = self.bus.take() else {
            return Err(OrchestratorError::AlreadyStarted);
        };
        self.phase = Phase::Running;

        let generation = self.launcher.open_generation().await?;
        info!("LLM server running at: {}", generation.endpoint());
        self.generation = Some(generation.clone());

        let transcription = self.launcher.open_transcription().await?;
        info!("STT server running at: {}", transcription.endpoint());
        self.transcription = Some(transcription.clone());

        let mut state = OrchestrationState::new(self.params.clone(), generation, transcription)
            .with_replacements(self.replacements)
            .with_reply_notifier(self.reply_notifier.clone())
            .with_conversation_logger(self.conversation_logger.clone())
            .with_shutdown(self.shutdown.clone());
        if let Some(system) = state.context.system_message() {
            state.log(ConversationEvent::message("system_prompt", system, None));
        }

        let shutdown = self.shutdown.clone();
        self.event_loop = Some(tokio::spawn(async move {
            bus.run(&mut state, &shutdown).await;
            (bus, state)
        }));

        if let Some(idle) = self.params.spontaneous_after {
            self.timer =
                Some(SpontaneousTimer::new(idle, self.publisher.clone()).spawn(self.shutdown.clone()));
        }

        info!("Orchestrator running");
        Ok(())
    }

    /// Stop the event loop and close every backend that was opened.
    ///
    /// Safe to call in any phase and more than once. A backend that fails to
    /// close is logged and does not keep the others open.
    pub async fn stop(&mut self) {
        if self.phase == Phase::Stopped {
            return;
        }
        self.phase = Phase::ShuttingDown;
        self.shutdown.cancel();

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(mut event_loop) = self.event_loop.take() {
            match tokio::time::timeout(self.drain_timeout, &mut event_loop).await {
                Ok(Ok((_bus, state))) => self.finished = Some(state),
                Ok(Err(e)) => warn!("Event loop task failed: {}", e),
                Err(_) => {
                    warn!(
                        "Event loop still busy after {:?}, abandoning in-flight event",
                        self.drain_timeout
                    );
                    event_loop.abort();
                }
            }
        }

        if let Some(generation) = self.generation.take() {
            close_backend(generation.as_ref()).await;
        }
        if let Some(transcription) = self.transcription.take() {
            close_backend(transcription.as_ref()).await;
        }

        self.phase = Phase::Stopped;
        info!("Orchestrator stopped");
    }

    /// Start, wait for the shutdown signal, then stop.
    ///
    /// Stop runs whether or not start succeeded; the start error (if any) is
    /// returned afterwards.
    pub async fn run(&mut self) -> Result<(), OrchestratorError> {
        let started = self.start().await;
        match &started {
            Ok(()) => self.shutdown.cancelled().await,
            Err(e) => warn!("Orchestrator failed to start: {}", e),
        }
        self.stop().await;
        started
    }
}

async fn close_backend<B: ManagedBackend + ?Sized>(backend: &B) {
    match backend.close().await {
        Ok(()) => info!("{} backend terminated", backend.name()),
        Err(e) => warn!("Failed to close {} backend: {}", backend.name(), e),
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if matches!(self.phase, Phase::Running | Phase::ShuttingDown) {
            warn!("Orchestrator dropped without stop(); cancelling tasks");
            self.shutdown.cancel();
            if let Some(timer) = self.timer.take() {
                timer.abort();
            }
            if let Some(event_loop) = self.event_loop.take() {
                event_loop.abort();
            }
        }
    }
}

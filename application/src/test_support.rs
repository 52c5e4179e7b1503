//! In-memory backends and notifiers for unit tests.

use crate::ports::backend::{
    BackendError, BackendLauncher, FragmentStream, GenerationBackend, ManagedBackend,
    TranscriptionBackend,
};
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::reply_notifier::ReplyNotifier;
use async_trait::async_trait;
use futures::{StreamExt, stream};
use orca_domain::{
    GenerationHyperparameters, Message, TranscriptionHyperparameters,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type CloseLog = Arc<Mutex<Vec<&'static str>>>;

enum GenerationScript {
    Reply(Vec<String>),
    FailAfter(Vec<String>),
    Slow(Vec<String>, Duration),
    Unreachable,
    Panic,
}

pub struct FakeGeneration {
    script: GenerationScript,
    prompts: Arc<Mutex<Vec<Vec<Message>>>>,
    close_log: CloseLog,
    close_fails: bool,
}

impl FakeGeneration {
    fn scripted(script: GenerationScript) -> Self {
        Self {
            script,
            prompts: Arc::default(),
            close_log: Arc::default(),
            close_fails: false,
        }
    }

    pub fn replying(fragments: &[&str]) -> Self {
        Self::scripted(GenerationScript::Reply(
            fragments.iter().map(|s| s.to_string()).collect(),
        ))
    }

    pub fn failing_after(fragments: &[&str]) -> Self {
        Self::scripted(GenerationScript::FailAfter(
            fragments.iter().map(|s| s.to_string()).collect(),
        ))
    }

    /// Each fragment arrives after `delay`.
    pub fn slow(fragments: &[&str], delay: Duration) -> Self {
        Self::scripted(GenerationScript::Slow(
            fragments.iter().map(|s| s.to_string()).collect(),
            delay,
        ))
    }

    pub fn unreachable() -> Self {
        Self::scripted(GenerationScript::Unreachable)
    }

    pub fn panicking() -> Self {
        Self::scripted(GenerationScript::Panic)
    }

    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = log;
        self
    }

    pub fn with_failing_close(mut self) -> Self {
        self.close_fails = true;
        self
    }

    pub fn seen_prompts(&self) -> Arc<Mutex<Vec<Vec<Message>>>> {
        self.prompts.clone()
    }
}

#[async_trait]
impl ManagedBackend for FakeGeneration {
    fn name(&self) -> &str {
        "llm"
    }

    fn endpoint(&self) -> &str {
        "http://fake/chat/completions"
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.close_log.lock().unwrap().push("llm");
        if self.close_fails {
            return Err(BackendError::Terminate {
                backend: "llm",
                message: "refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GenerationBackend for FakeGeneration {
    async fn generate(
        &self,
        messages: &[Message],
        _hyperparameters: &GenerationHyperparameters,
    ) -> Result<FragmentStream, BackendError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        match &self.script {
            GenerationScript::Reply(fragments) => {
                let items: Vec<Result<String, BackendError>> =
                    fragments.iter().cloned().map(Ok).collect();
                Ok(Box::pin(stream::iter(items)))
            }
            GenerationScript::FailAfter(fragments) => {
                let mut items: Vec<Result<String, BackendError>> =
                    fragments.iter().cloned().map(Ok).collect();
                items.push(Err(BackendError::Transport("connection reset".to_string())));
                Ok(Box::pin(stream::iter(items)))
            }
            GenerationScript::Slow(fragments, delay) => {
                let delay = *delay;
                let items: Vec<Result<String, BackendError>> =
                    fragments.iter().cloned().map(Ok).collect();
                Ok(Box::pin(stream::iter(items).then(move |item| async move {
                    tokio::time::sleep(delay).await;
                    item
                })))
            }
            GenerationScript::Unreachable => {
                Err(BackendError::Transport("connection refused".to_string()))
            }
            GenerationScript::Panic => panic!("generation backend exploded"),
        }
    }
}

#[derive(Default)]
pub struct FakeTranscription {
    text: String,
    fail: bool,
    close_log: CloseLog,
    calls: Arc<AtomicUsize>,
}

impl FakeTranscription {
    pub fn hearing(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = log;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ManagedBackend for FakeTranscription {
    fn name(&self) -> &str {
        "stt"
    }

    fn endpoint(&self) -> &str {
        "http://fake/inference"
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.close_log.lock().unwrap().push("stt");
        Ok(())
    }
}

#[async_trait]
impl TranscriptionBackend for FakeTranscription {
    async fn transcribe(
        &self,
        _hyperparameters: &TranscriptionHyperparameters,
        _audio_base64: &str,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BackendError::Status {
                status: 500,
                body: "model not loaded".to_string(),
            });
        }
        Ok(self.text.trim().to_string())
    }
}

/// Launcher handing out pre-built fakes; records open order in `open_log`.
pub struct FakeLauncher {
    generation: Mutex<Option<Arc<dyn GenerationBackend>>>,
    transcription: Mutex<Option<Arc<dyn TranscriptionBackend>>>,
    pub open_log: CloseLog,
    transcription_fails: AtomicBool,
}

impl FakeLauncher {
    pub fn new(generation: FakeGeneration, transcription: FakeTranscription) -> Self {
        Self {
            generation: Mutex::new(Some(Arc::new(generation))),
            transcription: Mutex::new(Some(Arc::new(transcription))),
            open_log: Arc::default(),
            transcription_fails: AtomicBool::new(false),
        }
    }

    pub fn with_failing_transcription(self) -> Self {
        self.transcription_fails.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl BackendLauncher for FakeLauncher {
    async fn open_generation(&self) -> Result<Arc<dyn GenerationBackend>, BackendError> {
        self.open_log.lock().unwrap().push("llm");
        self.generation
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BackendError::Launch {
                backend: "llm",
                message: "already opened".to_string(),
            })
    }

    async fn open_transcription(&self) -> Result<Arc<dyn TranscriptionBackend>, BackendError> {
        self.open_log.lock().unwrap().push("stt");
        if self.transcription_fails.load(Ordering::SeqCst) {
            return Err(BackendError::Launch {
                backend: "stt",
                message: "whisper-server not found".to_string(),
            });
        }
        self.transcription
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BackendError::Launch {
                backend: "stt",
                message: "already opened".to_string(),
            })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    fragments: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    failed: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn fragments(&self) -> Vec<String> {
        self.fragments.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn failed(&self) -> Vec<String> {
        self.failed.lock().unwrap().clone()
    }
}

impl ReplyNotifier for RecordingNotifier {
    fn on_fragment(&self, fragment: &str) {
        self.fragments.lock().unwrap().push(fragment.to_string());
    }

    fn on_reply_complete(&self, text: &str) {
        self.completed.lock().unwrap().push(text.to_string());
    }

    fn on_reply_failed(&self, error: &str) {
        self.failed.lock().unwrap().push(error.to_string());
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<(&'static str, serde_json::Value)>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.payload));
    }
}

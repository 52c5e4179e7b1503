//! Spawns the local inference servers on orchestrator start.

use super::llama::{LlamaServerBackend, LlamaServerConfig};
use super::whisper::{WhisperServerBackend, WhisperServerConfig};
use async_trait::async_trait;
use orca_application::ports::backend::{
    BackendError, BackendLauncher, GenerationBackend, TranscriptionBackend,
};
use std::sync::Arc;

/// [`BackendLauncher`] backed by llama-server and whisper-server processes.
pub struct LocalBackendLauncher {
    llama: LlamaServerConfig,
    whisper: WhisperServerConfig,
}

impl LocalBackendLauncher {
    pub fn new(llama: LlamaServerConfig, whisper: WhisperServerConfig) -> Self {
        Self { llama, whisper }
    }
}

#[async_trait]
impl BackendLauncher for LocalBackendLauncher {
    async fn open_generation(&self) -> Result<Arc<dyn GenerationBackend>, BackendError> {
        Ok(Arc::new(LlamaServerBackend::open(&self.llama).await?))
    }

    async fn open_transcription(&self) -> Result<Arc<dyn TranscriptionBackend>, BackendError> {
        Ok(Arc::new(WhisperServerBackend::open(&self.whisper).await?))
    }
}

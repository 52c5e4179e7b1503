//! whisper-server transcription backend.

use super::server::{ServerAddress, ServerProcess, check_status, executable, transport_error};
use crate::process::LaunchCommand;
use async_trait::async_trait;
use orca_application::ports::backend::{BackendError, ManagedBackend, TranscriptionBackend};
use orca_domain::TranscriptionHyperparameters;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub const INFERENCE_PATH: &str = "/inference";

#[derive(Debug, Clone)]
pub struct WhisperServerConfig {
    /// Directory holding the `whisper-server` executable.
    pub location: PathBuf,
    pub address: ServerAddress,
    pub model: PathBuf,
    /// Voice-activity-detection model.
    pub vad_model: PathBuf,
    pub log_dir: PathBuf,
    pub shutdown_grace: Duration,
}

impl WhisperServerConfig {
    /// whisper-server binds its default host; only the port is passed.
    pub fn command(&self) -> LaunchCommand {
        LaunchCommand::new(executable(&self.location, "whisper-server")).args([
            "-m".to_string(),
            self.model.to_string_lossy().into_owned(),
            "-vm".to_string(),
            self.vad_model.to_string_lossy().into_owned(),
            "-fa".to_string(),
            "--port".to_string(),
            self.address.port.to_string(),
        ])
    }

    pub fn endpoint(&self) -> String {
        self.address.url(INFERENCE_PATH)
    }
}

/// Transcription backend owning one whisper-server process.
pub struct WhisperServerBackend {
    server: ServerProcess,
}

impl WhisperServerBackend {
    pub async fn open(config: &WhisperServerConfig) -> Result<Self, BackendError> {
        let server = ServerProcess::spawn(
            "stt",
            &config.command(),
            &config.log_dir,
            config.endpoint(),
            config.shutdown_grace,
        )
        .await?;
        Ok(Self { server })
    }
}

/// Trimmed `text` field of an inference response, empty when absent.
pub fn transcript_text(response: &Value) -> String {
    response
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[async_trait]
impl ManagedBackend for WhisperServerBackend {
    fn name(&self) -> &str {
        self.server.name()
    }

    fn endpoint(&self) -> &str {
        self.server.endpoint()
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.server.close().await
    }
}

#[async_trait]
impl TranscriptionBackend for WhisperServerBackend {
    async fn transcribe(
        &self,
        hyperparameters: &TranscriptionHyperparameters,
        audio_base64: &str,
    ) -> Result<String, BackendError> {
        debug!(
            "POST {} ({} bytes of audio)",
            self.server.endpoint(),
            audio_base64.len()
        );
        let response = self
            .server
            .client()
            .post(self.server.endpoint())
            .json(&hyperparameters.to_payload(audio_base64))
            .send()
            .await
            .map_err(transport_error)?;
        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(transcript_text(&body))
    }
}

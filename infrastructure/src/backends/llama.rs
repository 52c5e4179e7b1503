//! llama-server generation backend.

use super::server::{ServerAddress, ServerProcess, check_status, executable, transport_error};
use super::stream::fragment_stream;
use crate::process::LaunchCommand;
use async_trait::async_trait;
use orca_application::ports::backend::{
    BackendError, FragmentStream, GenerationBackend, ManagedBackend,
};
use orca_domain::{GenerationHyperparameters, Message};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Path llama-server serves OpenAI-style chat completions on.
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Fixed performance flags passed to every llama-server launch.
const PERFORMANCE_FLAGS: &[&str] = &[
    "-b", "2048", "-ub", "512", "-ngl", "255", "-sm", "none", "-fa", "1", "--cache-ram", "0",
    "-kvu", "-nocb", "-ctk", "q8_0", "-ctv", "q8_0", "--no-mmap", "--threads-http", "1",
    "--parallel", "1", "--cache-reuse", "128",
];

#[derive(Debug, Clone)]
pub struct LlamaServerConfig {
    /// Directory holding the `llama-server` executable.
    pub location: PathBuf,
    pub address: ServerAddress,
    pub model: PathBuf,
    /// Model name the server reports.
    pub alias: String,
    pub context_length: u32,
    pub log_dir: PathBuf,
    pub shutdown_grace: Duration,
}

impl LlamaServerConfig {
    pub fn command(&self) -> LaunchCommand {
        LaunchCommand::new(executable(&self.location, "llama-server"))
            .args(PERFORMANCE_FLAGS.iter().copied())
            .args([
                "--host".to_string(),
                self.address.host.clone(),
                "--port".to_string(),
                self.address.port.to_string(),
                "-m".to_string(),
                self.model.to_string_lossy().into_owned(),
                "-c".to_string(),
                self.context_length.to_string(),
                "--alias".to_string(),
                self.alias.clone(),
                "--no-prefill-assistant".to_string(),
            ])
    }

    pub fn endpoint(&self) -> String {
        self.address.url(CHAT_COMPLETIONS_PATH)
    }
}

/// Generation backend owning one llama-server process.
pub struct LlamaServerBackend {
    server: ServerProcess,
}

impl LlamaServerBackend {
    /// Launch llama-server. Returns before the model is loaded.
    pub async fn open(config: &LlamaServerConfig) -> Result<Self, BackendError> {
        let server = ServerProcess::spawn(
            "llm",
            &config.command(),
            &config.log_dir,
            config.endpoint(),
            config.shutdown_grace,
        )
        .await?;
        Ok(Self { server })
    }
}

#[async_trait]
impl ManagedBackend for LlamaServerBackend {
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
impl GenerationBackend for LlamaServerBackend {
    async fn generate(
        &self,
        messages: &[Message],
        hyperparameters: &GenerationHyperparameters,
    ) -> Result<FragmentStream, BackendError> {
        debug!("POST {} ({} messages)", self.server.endpoint(), messages.len());
        let response = self
            .server
            .client()
            .post(self.server.endpoint())
            .json(&hyperparameters.to_payload(messages))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        Ok(fragment_stream(response.bytes_stream()))
    }
}

//! Supervised inference-server process shared by both backends.

use crate::process::{LaunchCommand, SupervisedProcess, launch};
use orca_application::ports::backend::BackendError;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Where a server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `http://host:port<path>`
    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

/// Executable file name for `program` on this platform.
pub fn executable(location: &Path, program: &str) -> std::path::PathBuf {
    location.join(format!("{program}{}", std::env::consts::EXE_SUFFIX))
}

/// One owned server process plus the HTTP client bound to it.
pub struct ServerProcess {
    name: &'static str,
    endpoint: String,
    client: reqwest::Client,
    process: Mutex<Option<SupervisedProcess>>,
    shutdown_grace: Duration,
}

impl ServerProcess {
    /// Launch the server without waiting for it to accept requests.
    pub async fn spawn(
        name: &'static str,
        command: &LaunchCommand,
        log_dir: &Path,
        endpoint: String,
        shutdown_grace: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BackendError::Launch {
                backend: name,
                message: format!("HTTP client: {e}"),
            })?;

        debug!("Launching {} backend: {}", name, command.command_line());
        let process = launch(command, log_dir)
            .await
            .map_err(|e| BackendError::Launch {
                backend: name,
                message: e.to_string(),
            })?;
        debug!("{} backend log: {}", name, process.log_path().display());

        Ok(Self {
            name,
            endpoint,
            client,
            process: Mutex::new(Some(process)),
            shutdown_grace,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Terminate the process and wait for it, force-killing after the
    /// shutdown grace period. Later calls return immediately.
    pub async fn close(&self) -> Result<(), BackendError> {
        let process = self
            .process
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(process) = process else {
            return Ok(());
        };

        let Some(record) = process.terminate_and_wait(self.shutdown_grace).await else {
            return Err(BackendError::Terminate {
                backend: self.name,
                message: format!("{} exit status unavailable", process.program()),
            });
        };
        debug!("{} backend exit: {:?}", self.name, record);
        info!("{} server terminated", self.name.to_uppercase());
        Ok(())
    }
}

/// Map a non-success response to [`BackendError::Status`].
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

pub fn transport_error(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

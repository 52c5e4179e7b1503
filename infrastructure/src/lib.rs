//! Infrastructure layer for orca
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the subprocess supervisor, the llama-server and
//! whisper-server backends, configuration file loading and the JSONL
//! transcript logger.

pub mod backends;
pub mod config;
pub mod logging;
pub mod process;

// Re-export commonly used types
pub use backends::{
    LlamaServerBackend, LlamaServerConfig, LocalBackendLauncher, ServerAddress,
    WhisperServerBackend, WhisperServerConfig,
};
pub use config::{ConfigIssue, ConfigLoader, OrcaConfig, Severity};
pub use logging::JsonlConversationLogger;
pub use process::{LaunchCommand, SupervisedProcess, SupervisorError, launch};

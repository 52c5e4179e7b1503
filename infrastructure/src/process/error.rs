//! Error types for the subprocess supervisor

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for supervisor operations
pub type Result<T> = std::result::Result<T, SupervisorError>;

/// Errors that make a launch fail.
///
/// Anything that goes wrong after the process started (stream reads, log
/// writes) is recorded in the process log instead.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Empty command line")]
    EmptyCommand,

    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateLogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file {}: {source}", path.display())]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

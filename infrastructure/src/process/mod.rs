//! Subprocess supervision with per-process log files.

mod error;
mod log_file;
mod supervisor;
mod termination;

pub use error::{Result, SupervisorError};
pub use log_file::{ExitSummary, ProcessLog, StreamLabel};
pub use supervisor::{ExitRecord, LaunchCommand, SupervisedProcess, launch};
pub use termination::{TerminationSignal, exit_code, hostname};

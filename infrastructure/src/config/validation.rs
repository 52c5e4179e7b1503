//! Configuration validation results.

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the orchestrator cannot start with this configuration.
    Error,
    /// Non-fatal: startup continues but something will likely misbehave.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A model file path is not set.
    MissingModelPath { field: &'static str },
    /// A backend port is 0.
    ZeroPort { field: &'static str },
    /// Both backends would listen on the same port.
    PortCollision { port: u16 },
    /// `keep_recent` must be smaller than `max_messages`.
    InvalidCompaction {
        max_messages: usize,
        keep_recent: usize,
    },
    /// The server executable was not found at the configured location.
    MissingExecutable { field: &'static str },
}

/// A detected issue in the loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

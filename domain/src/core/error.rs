//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown message role: {0}")]
    UnknownRole(String),

    #[error("Invalid compaction policy: keep_recent ({keep_recent}) must be below max_messages ({max_messages})")]
    InvalidCompaction {
        max_messages: usize,
        keep_recent: usize,
    },

    #[error("Participant '{participant}' may not inject {role} messages")]
    Unauthorized { participant: String, role: String },
}

impl DomainError {
    /// Check if this error is a privilege violation
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, DomainError::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_display() {
        let error = DomainError::UnknownRole("tool".to_string());
        assert_eq!(error.to_string(), "Unknown message role: tool");
    }

    #[test]
    fn test_is_unauthorized_check() {
        let denied = DomainError::Unauthorized {
            participant: "guest".to_string(),
            role: "system".to_string(),
        };
        assert!(denied.is_unauthorized());
        assert!(!DomainError::UnknownRole("x".to_string()).is_unauthorized());
    }
}

//! Event handling errors

use crate::ports::backend::BackendError;
use orca_domain::{DomainError, ParticipantId};
use thiserror::Error;

/// Why one event could not be applied.
///
/// These never stop the event loop; the bus logs them and moves on.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Domain error: {0}")]
    Domain(DomainError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Participant '{participant}' may not inject {role} messages")]
    Unauthorized { participant: String, role: String },

    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),
}

impl From<DomainError> for EventError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Unauthorized { participant, role } => {
                EventError::Unauthorized { participant, role }
            }
            other => EventError::Domain(other),
        }
    }
}

impl EventError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EventError::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_domain_error_is_lifted() {
        let err: EventError = DomainError::Unauthorized {
            participant: "guest".to_string(),
            role: "system".to_string(),
        }
        .into();
        assert!(err.is_unauthorized());
        assert_eq!(
            err.to_string(),
            "Participant 'guest' may not inject system messages"
        );
    }

    #[test]
    fn test_other_domain_errors_stay_wrapped() {
        let err: EventError = DomainError::UnknownRole("tool".to_string()).into();
        assert!(matches!(err, EventError::Domain(_)));
    }
}

//! Conversation participants.
//!
//! A participant is whoever sits on the other end of a connection: a person
//! at the console, a websocket client, a tool runner. Only privileged
//! participants may inject `system` messages.

use crate::conversation::entities::Role;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a connected participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub privileged: bool,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            privileged: false,
        }
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Check whether this participant may inject a message with `role`.
    pub fn authorize_injection(&self, role: Role) -> Result<(), DomainError> {
        if role == Role::System && !self.privileged {
            return Err(DomainError::Unauthorized {
                participant: self.name.clone(),
                role: role.to_string(),
            });
        }
        Ok(())
    }
}

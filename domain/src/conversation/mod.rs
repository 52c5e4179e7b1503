//! Conversation domain.
//!
//! - [`entities::Message`] / [`entities::Role`]: one transcript entry
//! - [`context::Context`]: the ordered transcript with its system prompt
//! - [`context::CompactionPolicy`]: message-count based shrinking
//! - [`template::SystemPromptTemplate`]: placeholder substitution

pub mod context;
pub mod entities;
pub mod template;

//! Application-level configuration.
//!
//! - [`ConversationParams`]: settings the event handlers run with

pub mod conversation_params;

pub use conversation_params::ConversationParams;

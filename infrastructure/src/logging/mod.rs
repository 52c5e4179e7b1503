//! Transcript logging.
//!
//! Provides [`JsonlConversationLogger`], the JSONL file adapter for the
//! [`ConversationLogger`](orca_application::ConversationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;

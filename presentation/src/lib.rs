//! Presentation layer for orca
//!
//! This crate contains the CLI definition, the stdin console channel and
//! terminal rendering of streamed replies.

pub mod cli;
pub mod console;
pub mod output;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use console::{ConsoleChannel, ConsoleInput};
pub use output::console::{ConsoleFormatter, ConsoleReplyNotifier};

//! Terminal participant

pub mod channel;
pub mod input;

pub use channel::ConsoleChannel;
pub use input::ConsoleInput;

//! Event queue and handler errors.

pub mod bus;
pub mod error;

pub use bus::{BusStats, DispatchOutcome, EventBus, EventPublisher, PublishError};
pub use error::EventError;

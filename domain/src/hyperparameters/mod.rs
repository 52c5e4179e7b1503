//! Per-request backend controls.
//!
//! Both records are immutable per call and can be reused across requests.

pub mod generation;
pub mod transcription;

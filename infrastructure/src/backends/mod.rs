//! Local inference-server adapters.
//!
//! Each backend owns exactly one supervised server process and talks to it
//! over HTTP on localhost.

pub mod launcher;
pub mod llama;
pub mod server;
pub mod stream;
pub mod whisper;

pub use launcher::LocalBackendLauncher;
pub use llama::{LlamaServerBackend, LlamaServerConfig};
pub use server::ServerAddress;
pub use whisper::{WhisperServerBackend, WhisperServerConfig};

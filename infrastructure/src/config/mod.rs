//! Configuration file loading for orca
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `ORCA_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./orca.toml`
//! 4. Global: `$XDG_CONFIG_HOME/orca/config.toml`
//! 5. Default values

mod file_config;
mod loader;
mod validation;

pub use file_config::{
    FileBackendsConfig, FileChatConfig, FileCompactionConfig, FileParticipantsConfig,
    FileSttConfig, FileTranscriptConfig, OrcaConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX, PROJECT_CONFIG_FILE};
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};

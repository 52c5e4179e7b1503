//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for orca
#[derive(Parser, Debug)]
#[command(name = "orca")]
#[command(author, version, about = "Local multi-backend conversational assistant")]
#[command(long_about = r#"
Orca supervises a local llama-server (text generation) and whisper-server
(speech-to-text), keeps the conversation transcript and runs every
conversation event through a single ordered queue.

Configuration files are loaded from (in priority order):
1. ORCA_* environment variables (ORCA_BACKENDS__LLM_PORT=8000)
2. --config <path>     Explicit config file
3. ./orca.toml         Project-level config
4. ~/.config/orca/config.toml   Global config

Example:
  orca --console
  orca --config assistant.toml -vv --log-dir ./logs
"#)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory for the orchestrator's own rolling log and the backend logs
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Chat with the assistant from this terminal
    #[arg(long)]
    pub console: bool,
}

impl Cli {
    /// Default `tracing` filter for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["orca"]);
        assert!(cli.config.is_none());
        assert!(!cli.no_config);
        assert!(!cli.console);
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "orca",
            "--config",
            "assistant.toml",
            "-vv",
            "--log-dir",
            "logs",
            "--console",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("assistant.toml")));
        assert_eq!(cli.log_dir, Some(PathBuf::from("logs")));
        assert_eq!(cli.log_level(), "debug");
        assert!(cli.console);
    }

    #[test]
    fn test_verbosity_caps_at_trace() {
        assert_eq!(Cli::parse_from(["orca", "-vvvv"]).log_level(), "trace");
    }
}

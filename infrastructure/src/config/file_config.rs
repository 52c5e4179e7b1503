//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout. Every section is optional;
//! missing fields keep the defaults below.

use super::validation::{ConfigIssue, ConfigIssueCode};
use crate::backends::{LlamaServerConfig, ServerAddress, WhisperServerConfig};
use orca_application::ConversationParams;
use orca_domain::{
    CompactionPolicy, DomainError, GenerationHyperparameters, TranscriptionHyperparameters,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrcaConfig {
    /// Assistant name, passed to the generation server as `--alias`.
    pub name: String,
    pub chat: FileChatConfig,
    pub stt: FileSttConfig,
    pub backends: FileBackendsConfig,
    pub participants: FileParticipantsConfig,
    pub transcript: FileTranscriptConfig,
}

impl Default for OrcaConfig {
    fn default() -> Self {
        Self {
            name: "Orca".to_string(),
            chat: FileChatConfig::default(),
            stt: FileSttConfig::default(),
            backends: FileBackendsConfig::default(),
            participants: FileParticipantsConfig::default(),
            transcript: FileTranscriptConfig::default(),
        }
    }
}

/// `[chat]`: the generation side of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// System prompt template; `<date>` and `<time>` are substituted.
    pub system_prompt: String,
    pub model_path: Option<PathBuf>,
    pub context_length: u32,
    /// Partial override of the generation defaults.
    pub hyperparameters: GenerationHyperparameters,
    /// Idle seconds before a spontaneous generation; absent disables it.
    pub spontaneous_after_secs: Option<u64>,
    pub compaction: FileCompactionConfig,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            model_path: None,
            context_length: 4096,
            hyperparameters: GenerationHyperparameters::default(),
            spontaneous_after_secs: None,
            compaction: FileCompactionConfig::default(),
        }
    }
}

/// `[chat.compaction]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCompactionConfig {
    pub max_messages: usize,
    pub keep_recent: usize,
}

impl Default for FileCompactionConfig {
    fn default() -> Self {
        let policy = CompactionPolicy::default();
        Self {
            max_messages: policy.max_messages(),
            keep_recent: policy.keep_recent(),
        }
    }
}

/// `[stt]`: the speech-to-text side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSttConfig {
    pub model_path: Option<PathBuf>,
    /// Voice-activity-detection model.
    pub vad_path: Option<PathBuf>,
    /// Bias prompt; overrides `hyperparameters.prompt` when non-empty.
    pub prompt: String,
    pub hyperparameters: TranscriptionHyperparameters,
}

/// `[backends]`: where the inference servers live and listen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendsConfig {
    pub host: String,
    pub llm_port: u16,
    pub stt_port: u16,
    pub llama_location: PathBuf,
    pub whisper_location: PathBuf,
    /// Directory for per-process log files.
    pub log_dir: PathBuf,
    /// Seconds to wait after SIGTERM before force-killing a server.
    pub shutdown_grace_secs: u64,
}

impl Default for FileBackendsConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            llm_port: 8000,
            stt_port: 8001,
            llama_location: PathBuf::from("./vendor/bin/llama.cpp"),
            whisper_location: PathBuf::from("./vendor/bin/whisper.cpp"),
            log_dir: PathBuf::from("./logs"),
            shutdown_grace_secs: 10,
        }
    }
}

/// `[participants]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileParticipantsConfig {
    /// Names allowed to inject `system` messages.
    pub privileged: Vec<String>,
}

/// `[transcript]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTranscriptConfig {
    /// JSONL transcript log; absent disables it.
    pub log_path: Option<PathBuf>,
}

impl OrcaConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (field, path) in [
            ("chat.model_path", &self.chat.model_path),
            ("stt.model_path", &self.stt.model_path),
            ("stt.vad_path", &self.stt.vad_path),
        ] {
            if path.as_ref().is_none_or(|p| p.as_os_str().is_empty()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::MissingModelPath { field },
                    format!("{field} is not set"),
                ));
            }
        }

        let backends = &self.backends;
        for (field, port) in [
            ("backends.llm_port", backends.llm_port),
            ("backends.stt_port", backends.stt_port),
        ] {
            if port == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroPort { field },
                    format!("{field} must not be 0"),
                ));
            }
        }
        if backends.llm_port != 0 && backends.llm_port == backends.stt_port {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::PortCollision {
                    port: backends.llm_port,
                },
                format!(
                    "backends.llm_port and backends.stt_port are both {}",
                    backends.llm_port
                ),
            ));
        }

        let compaction = &self.chat.compaction;
        if compaction.keep_recent >= compaction.max_messages {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidCompaction {
                    max_messages: compaction.max_messages,
                    keep_recent: compaction.keep_recent,
                },
                format!(
                    "chat.compaction.keep_recent ({}) must be smaller than max_messages ({})",
                    compaction.keep_recent, compaction.max_messages
                ),
            ));
        }

        for (field, location, program) in [
            (
                "backends.llama_location",
                &backends.llama_location,
                "llama-server",
            ),
            (
                "backends.whisper_location",
                &backends.whisper_location,
                "whisper-server",
            ),
        ] {
            let executable = crate::backends::server::executable(location, program);
            if !executable.exists() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::MissingExecutable { field },
                    format!("{} not found", executable.display()),
                ));
            }
        }

        issues
    }

    /// Settings the event handlers run with.
    pub fn to_conversation_params(&self) -> Result<ConversationParams, DomainError> {
        let compaction = CompactionPolicy::new(
            self.chat.compaction.max_messages,
            self.chat.compaction.keep_recent,
        )?;

        let mut transcription = self.stt.hyperparameters.clone();
        if !self.stt.prompt.is_empty() {
            transcription = transcription.with_prompt(self.stt.prompt.clone());
        }

        Ok(ConversationParams {
            system_prompt: self.chat.system_prompt.clone().into(),
            generation: self.chat.hyperparameters.clone(),
            transcription,
            compaction,
            spontaneous_after: self.chat.spontaneous_after_secs.map(Duration::from_secs),
            privileged_names: self.participants.privileged.clone(),
        })
    }

    /// Launch settings for llama-server. `log_dir` overrides the configured one.
    pub fn llama_server(&self, log_dir: Option<&Path>) -> LlamaServerConfig {
        LlamaServerConfig {
            location: self.backends.llama_location.clone(),
            address: ServerAddress::new(self.backends.host.clone(), self.backends.llm_port),
            model: self.chat.model_path.clone().unwrap_or_default(),
            alias: self.name.clone(),
            context_length: self.chat.context_length,
            log_dir: self.log_dir(log_dir),
            shutdown_grace: self.shutdown_grace(),
        }
    }

    /// Launch settings for whisper-server. `log_dir` overrides the configured one.
    pub fn whisper_server(&self, log_dir: Option<&Path>) -> WhisperServerConfig {
        WhisperServerConfig {
            location: self.backends.whisper_location.clone(),
            address: ServerAddress::new(self.backends.host.clone(), self.backends.stt_port),
            model: self.stt.model_path.clone().unwrap_or_default(),
            vad_model: self.stt.vad_path.clone().unwrap_or_default(),
            log_dir: self.log_dir(log_dir),
            shutdown_grace: self.shutdown_grace(),
        }
    }

    fn log_dir(&self, over: Option<&Path>) -> PathBuf {
        over.map_or_else(|| self.backends.log_dir.clone(), Path::to_path_buf)
    }

    fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.backends.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::Severity;

    fn complete() -> OrcaConfig {
        let mut config = OrcaConfig::default();
        config.chat.model_path = Some(PathBuf::from("models/llm.gguf"));
        config.stt.model_path = Some(PathBuf::from("models/stt.bin"));
        config.stt.vad_path = Some(PathBuf::from("models/vad.bin"));
        config
    }

    fn errors(config: &OrcaConfig) -> Vec<ConfigIssueCode> {
        config
            .validate()
            .into_iter()
            .filter(ConfigIssue::is_error)
            .map(|i| i.code)
            .collect()
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
name = "Nova"

[chat]
model_path = "models/llm.gguf"
spontaneous_after_secs = 30

[chat.compaction]
max_messages = 10
keep_recent = 4

[stt]
prompt = "Orca, Nova"

[stt.hyperparameters]
beam_size = 2

[participants]
privileged = ["operator"]

[transcript]
log_path = "logs/transcript.jsonl"
"#;

        let config: OrcaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.name, "Nova");
        assert_eq!(config.chat.model_path, Some(PathBuf::from("models/llm.gguf")));
        assert_eq!(config.chat.context_length, 4096);
        assert_eq!(config.stt.hyperparameters.beam_size, 2);
        assert!(config.stt.hyperparameters.vad);
        assert_eq!(config.backends, FileBackendsConfig::default());
        assert_eq!(
            config.transcript.log_path,
            Some(PathBuf::from("logs/transcript.jsonl"))
        );

        let params = config.to_conversation_params().unwrap();
        assert_eq!(params.spontaneous_after, Some(Duration::from_secs(30)));
        assert_eq!(params.compaction, CompactionPolicy::new(10, 4).unwrap());
        assert_eq!(params.transcription.prompt, "Orca, Nova");
        assert!(params.is_privileged_name("operator"));
    }

    #[test]
    fn test_default_config_is_missing_models() {
        let codes = errors(&OrcaConfig::default());
        assert_eq!(
            codes,
            vec![
                ConfigIssueCode::MissingModelPath {
                    field: "chat.model_path"
                },
                ConfigIssueCode::MissingModelPath {
                    field: "stt.model_path"
                },
                ConfigIssueCode::MissingModelPath {
                    field: "stt.vad_path"
                },
            ]
        );
    }

    #[test]
    fn test_complete_config_has_no_errors() {
        assert!(errors(&complete()).is_empty());
    }

    #[test]
    fn test_missing_executables_are_warnings() {
        let mut config = complete();
        config.backends.llama_location = PathBuf::from("/nonexistent/llama");
        let issues = config.validate();
        let issue = issues
            .iter()
            .find(|i| {
                i.code
                    == ConfigIssueCode::MissingExecutable {
                        field: "backends.llama_location",
                    }
            })
            .unwrap();
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn test_port_problems() {
        let mut config = complete();
        config.backends.stt_port = config.backends.llm_port;
        assert_eq!(
            errors(&config),
            vec![ConfigIssueCode::PortCollision { port: 8000 }]
        );

        config.backends.llm_port = 0;
        config.backends.stt_port = 0;
        assert_eq!(errors(&config).len(), 2);
    }

    #[test]
    fn test_invalid_compaction() {
        let mut config = complete();
        config.chat.compaction.keep_recent = 64;
        assert_eq!(
            errors(&config),
            vec![ConfigIssueCode::InvalidCompaction {
                max_messages: 64,
                keep_recent: 64
            }]
        );
        assert!(config.to_conversation_params().is_err());
    }

    #[test]
    fn test_server_configs() {
        let config = complete();
        let llama = config.llama_server(None);
        assert_eq!(llama.alias, "Orca");
        assert_eq!(llama.endpoint(), "http://127.0.0.1:8000/chat/completions");
        assert_eq!(llama.log_dir, PathBuf::from("./logs"));
        assert_eq!(llama.shutdown_grace, Duration::from_secs(10));

        let whisper = config.whisper_server(Some(Path::new("/tmp/orca-logs")));
        assert_eq!(whisper.endpoint(), "http://127.0.0.1:8001/inference");
        assert_eq!(whisper.vad_model, PathBuf::from("models/vad.bin"));
        assert_eq!(whisper.log_dir, PathBuf::from("/tmp/orca-logs"));
    }
}

//! Decoding controls for the speech-to-text backend.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionHyperparameters {
    pub beam_size: u32,
    /// Bias prompt handed to the decoder.
    pub prompt: String,
    pub suppress_non_speech: bool,
    pub temperature: f64,
    /// Voice-activity detection.
    pub vad: bool,
}

impl Default for TranscriptionHyperparameters {
    fn default() -> Self {
        Self {
            beam_size: 5,
            prompt: String::new(),
            suppress_non_speech: false,
            temperature: 0.0,
            vad: true,
        }
    }
}

impl TranscriptionHyperparameters {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn to_payload(&self, audio_base64: &str) -> Value {
        json!({
            "audio": audio_base64,
            "prompt": self.prompt,
            "suppress_non_speech": self.suppress_non_speech,
            "temperature": self.temperature,
            "beam_size": self.beam_size,
            "vad": self.vad,
        })
    }
}

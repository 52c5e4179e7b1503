//! Sampling controls for the text-generation backend.

use crate::conversation::entities::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Sampling / decoding controls for one generation request.
///
/// Deserializes from a partial map: every missing field keeps its default,
/// so a config section only has to name what it overrides. The defaults are
/// part of the reproducibility contract of a generation and must not drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationHyperparameters {
    pub temperature: f64,
    pub min_p: f64,
    pub top_k: i32,
    pub presence_penalty: f64,
    /// Sent as `repeat_penalty`.
    pub repetition_penalty: f64,
    pub repeat_last_n: i32,

    // XTC
    pub xtc_threshold: f64,
    pub xtc_probability: f64,

    // DRY sampling
    pub dry_multiplier: f64,
    pub dry_base: f64,
    pub dry_allowed_length: i32,
    pub dry_penalty_last_n: i32,
    pub dry_sequence_breakers: Vec<String>,

    pub n_predict: i32,
    pub logit_bias: Vec<Value>,
    pub samplers: Vec<String>,
    pub seed: i64,
}

impl Default for GenerationHyperparameters {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            min_p: 0.1,
            top_k: 40,
            presence_penalty: 0.0,
            repetition_penalty: 1.0,
            repeat_last_n: 64,
            xtc_threshold: 0.1,
            xtc_probability: 0.0,
            dry_multiplier: 0.0,
            dry_base: 1.75,
            dry_allowed_length: 2,
            dry_penalty_last_n: -1,
            dry_sequence_breakers: ["\n", ":", "\"", "*"].map(String::from).to_vec(),
            n_predict: 512,
            logit_bias: Vec::new(),
            samplers: ["dry", "top_k", "typ_p", "top_p", "min_p", "xtc", "temperature"]
                .map(String::from)
                .to_vec(),
            seed: -1,
        }
    }
}

impl GenerationHyperparameters {
    /// Slot the server keeps the prompt cache in; one conversation, one slot.
    pub const ID_SLOT: i32 = 0;

    /// Build the streaming chat-completion request body.
    pub fn to_payload(&self, messages: &[Message]) -> Value {
        json!({
            "messages": messages,

            "temperature": self.temperature,

            "xtc_threshold": self.xtc_threshold,
            "xtc_probability": self.xtc_probability,

            "min_p": self.min_p,
            "top_k": self.top_k,

            "presence_penalty": self.presence_penalty,
            "repeat_penalty": self.repetition_penalty,
            "repeat_last_n": self.repeat_last_n,

            "id_slot": Self::ID_SLOT,
            "cache_prompt": true,
            "stream": true,
            "n_predict": self.n_predict,
            "seed": self.seed,
            "logit_bias": self.logit_bias,
            "samplers": self.samplers,

            "dry_multiplier": self.dry_multiplier,
            "dry_base": self.dry_base,
            "dry_allowed_length": self.dry_allowed_length,
            "dry_penalty_last_n": self.dry_penalty_last_n,
            "dry_sequence_breakers": self.dry_sequence_breakers,
        })
    }
}

//! Sampling configuration for generation backends.

use docqa_rag::{RagError, Result};
use serde::{Deserialize, Serialize};

/// Stop sequences for Llama-2 chat models.
pub const LLAMA2_STOP_SEQUENCES: [&str; 3] = ["<s>", "[INST]", "[/INST]"];

/// Sampling parameters sent with every completion request.
///
/// The defaults suit a small quantized Llama-2 chat model answering from a
/// few retrieved passages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model name sent to the server. Single-model servers ignore it.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
    /// Generation halts at the first occurrence of any of these.
    pub stop: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "llama-2-7b-chat".to_string(),
            max_tokens: 128,
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            repeat_penalty: 1.1,
            stop: LLAMA2_STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GenerationConfig {
    /// Default sampling parameters for the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), ..Default::default() }
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set nucleus sampling probability mass.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the number of candidate tokens considered at each step.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_repeat_penalty(mut self, repeat_penalty: f32) -> Self {
        self.repeat_penalty = repeat_penalty;
        self
    }

    /// Replace the stop sequences.
    pub fn with_stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }

    /// Check that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `max_tokens` is zero, the
    /// temperature is negative, `top_p` is outside `(0, 1]` or the repeat
    /// penalty is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(RagError::ConfigError("max_tokens must be greater than zero".into()));
        }
        if self.temperature.is_nan() || self.temperature < 0.0 {
            return Err(RagError::ConfigError("temperature must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.top_p) || self.top_p == 0.0 {
            return Err(RagError::ConfigError("top_p must be in (0, 1]".into()));
        }
        if self.repeat_penalty.is_nan() || self.repeat_penalty <= 0.0 {
            return Err(RagError::ConfigError("repeat_penalty must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_llama2_chat_deployment() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_tokens, 128);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_p, 0.95);
        assert_eq!(config.top_k, 40);
        assert_eq!(config.repeat_penalty, 1.1);
        assert_eq!(config.stop, vec!["<s>", "[INST]", "[/INST]"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = GenerationConfig::new("mistral")
            .with_max_tokens(256)
            .with_temperature(0.0)
            .with_stop(["\n\n"]);
        assert_eq!(config.model, "mistral");
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.stop, vec!["\n\n"]);
        assert_eq!(config.top_k, 40);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(GenerationConfig::default().with_max_tokens(0).validate().is_err());
        assert!(GenerationConfig::default().with_temperature(-0.1).validate().is_err());
        assert!(GenerationConfig::default().with_top_p(0.0).validate().is_err());
        assert!(GenerationConfig::default().with_top_p(1.5).validate().is_err());
        assert!(GenerationConfig::default().with_repeat_penalty(0.0).validate().is_err());
        assert!(GenerationConfig::default().with_temperature(f32::NAN).validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"model": "phi-3", "max_tokens": 64}"#).unwrap();
        assert_eq!(config.model, "phi-3");
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.top_p, 0.95);
    }
}

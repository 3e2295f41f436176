//! Generator for OpenAI-compatible text completion servers.
//!
//! Works with any server exposing `POST {base_url}/completions`: the
//! llama.cpp server, vLLM, Ollama or the OpenAI API itself. Servers that do
//! not understand the llama.cpp sampling extensions (`top_k`,
//! `repeat_penalty`) ignore them.

use std::time::Duration;

use async_trait::async_trait;
use docqa_rag::{Generator, RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::GenerationConfig;

/// Base URL of a llama.cpp server started with default flags.
pub const LLAMA_CPP_API_BASE: &str = "http://127.0.0.1:8080/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A [`Generator`] backed by an OpenAI-compatible completions API.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_model::{GenerationConfig, OpenAICompatibleGenerator};
///
/// let generator = OpenAICompatibleGenerator::new(
///     "http://127.0.0.1:8080/v1",
///     GenerationConfig::default(),
/// )?;
/// let answer = generator.generate("<s>[INST] Hi [/INST]").await?;
/// ```
pub struct OpenAICompatibleGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    config: GenerationConfig,
    name: String,
}

impl OpenAICompatibleGenerator {
    /// Create a generator for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the sampling configuration is
    /// invalid, or [`RagError::GenerationError`] if the HTTP client cannot be
    /// built.
    pub fn new(base_url: impl Into<String>, config: GenerationConfig) -> Result<Self> {
        config.validate()?;
        let name = format!("openai-compatible:{}", config.model);
        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build().map_err(|e| {
            RagError::GenerationError {
                backend: name.clone(),
                message: format!("failed to build HTTP client: {e}"),
            }
        })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url, api_key: None, config, name })
    }

    /// Send this key as a bearer token. An empty key sends none.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    /// The sampling configuration sent with each request.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// The server base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn error(&self, message: String) -> RagError {
        RagError::GenerationError { backend: self.name.clone(), message }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repeat_penalty: f32,
    stop: &'a [String],
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl Generator for OpenAICompatibleGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(backend = %self.name, prompt_len = prompt.len(), "requesting completion");

        let body = CompletionRequest {
            model: &self.config.model,
            prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            top_k: self.config.top_k,
            repeat_penalty: self.config.repeat_penalty,
            stop: &self.config.stop,
            stream: false,
        };
        let mut request = self.client.post(format!("{}/completions", self.base_url)).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(backend = %self.name, error = %e, "request failed");
            self.error(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(backend = %self.name, %status, "API error");
            return Err(self.error(format!("API returned {status}: {detail}")));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!(backend = %self.name, error = %e, "failed to parse response");
            self.error(format!("failed to parse response: {e}"))
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .ok_or_else(|| self.error("API returned no choices".into()))?;

        debug!(backend = %self.name, response_len = text.len(), "completion received");
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let config = GenerationConfig::default().with_max_tokens(0);
        assert!(matches!(
            OpenAICompatibleGenerator::new(LLAMA_CPP_API_BASE, config),
            Err(RagError::ConfigError(_))
        ));
    }

    #[test]
    fn base_url_and_name() {
        let generator =
            OpenAICompatibleGenerator::new("http://localhost:8080/v1/", GenerationConfig::new("tiny"))
                .unwrap()
                .with_api_key("");
        assert_eq!(generator.base_url(), "http://localhost:8080/v1");
        assert_eq!(generator.name(), "openai-compatible:tiny");
        assert!(generator.api_key.is_none());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_generation_error() {
        let generator =
            OpenAICompatibleGenerator::new("http://127.0.0.1:9", GenerationConfig::default())
                .unwrap();
        let err = generator.generate("hello").await.unwrap_err();
        assert!(matches!(err, RagError::GenerationError { .. }));
    }
}

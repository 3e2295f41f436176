//! OpenAI-compatible embedding provider.
//!
//! Talks to any server implementing `POST {base_url}/embeddings`: the OpenAI
//! API itself, or a local Ollama, llama.cpp or vLLM server.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default model for OpenAI embeddings.
const DEFAULT_MODEL: &str = "text-embedding-3-small";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// # Configuration
///
/// - `base_url` – defaults to `https://api.openai.com/v1`.
/// - `model` – defaults to `text-embedding-3-small`.
/// - `api_key` – optional for local servers, required by OpenAI.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::compatible("http://localhost:11434/v1", "all-minilm")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for the OpenAI API with the given key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::EmbeddingError {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }
        Self::build(OPENAI_API_BASE.into(), Some(api_key), DEFAULT_MODEL.into())
    }

    /// Create a provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::EmbeddingError {
            provider: "OpenAI".into(),
            message: "OPENAI_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Create a provider for an OpenAI-compatible server that needs no key.
    pub fn compatible(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None, model.into())
    }

    fn build(base_url: String, api_key: Option<String>, model: String) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build().map_err(|e| {
            RagError::EmbeddingError {
                provider: "OpenAI".into(),
                message: format!("failed to build HTTP client: {e}"),
            }
        })?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key, model })
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key sent as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    /// The model requested from the server.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn error(&self, message: String) -> RagError {
        RagError::EmbeddingError { provider: format!("OpenAI:{}", self.model), message }
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| self.error("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "OpenAI",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbeddingRequest { model: &self.model, input: texts };
        let mut request =
            self.client.post(format!("{}/embeddings", self.base_url)).json(&request_body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "request failed");
            self.error(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = "OpenAI", %status, "API error");
            return Err(self.error(format!("API returned {status}: {detail}")));
        }

        let mut embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse response");
            self.error(format!("failed to parse response: {e}"))
        })?;

        if embedding_response.data.len() != texts.len() {
            return Err(self.error(format!(
                "API returned {} embeddings for {} inputs",
                embedding_response.data.len(),
                texts.len()
            )));
        }

        embedding_response.data.sort_by_key(|d| d.index);
        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

//! Backend selection shared by the server and CLI binaries.

use std::sync::Arc;

use docqa_model::openai::LLAMA_CPP_API_BASE;
use docqa_model::{GenerationConfig, MockGenerator, OpenAICompatibleGenerator};
use docqa_rag::openai::OpenAIEmbeddingProvider;
use docqa_rag::{
    EmbeddingProvider, Generator, HashEmbeddingProvider, RagConfig, RagPipeline, Result,
};
use tracing::info;

/// Which embedding and generation backends to wire into a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// OpenAI-compatible embeddings endpoint. `None` uses local feature
    /// hashing.
    pub embedding_url: Option<String>,
    pub embedding_model: String,
    /// Vector length of the hashing embedder.
    pub hash_dimensions: usize,
    /// OpenAI-compatible completions endpoint.
    pub generation_url: String,
    pub generation: GenerationConfig,
    /// Answer with the assembled prompt instead of calling a model.
    pub offline: bool,
    /// Bearer token for both endpoints.
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            embedding_url: None,
            embedding_model: "nomic-embed-text".to_string(),
            hash_dimensions: docqa_rag::hashing::DEFAULT_DIMENSIONS,
            generation_url: LLAMA_CPP_API_BASE.to_string(),
            generation: GenerationConfig::default(),
            offline: false,
            api_key: None,
        }
    }
}

impl BackendConfig {
    /// Read overrides from `DOCQA_*` environment variables and
    /// `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DOCQA_EMBEDDING_URL") {
            config.embedding_url = (!url.is_empty()).then_some(url);
        }
        if let Ok(model) = std::env::var("DOCQA_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(url) = std::env::var("DOCQA_GENERATION_URL") {
            config.generation_url = url;
        }
        if let Ok(model) = std::env::var("DOCQA_GENERATION_MODEL") {
            config.generation.model = model;
        }
        config.offline = std::env::var("DOCQA_OFFLINE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        config.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        config
    }

    /// Construct the embedding backend.
    ///
    /// # Errors
    ///
    /// Fails if the hashing dimension is zero or the HTTP client cannot be
    /// built.
    pub fn embedding_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match &self.embedding_url {
            Some(url) => {
                let mut provider = OpenAIEmbeddingProvider::compatible(url, &self.embedding_model)?;
                if let Some(key) = &self.api_key {
                    provider = provider.with_api_key(key);
                }
                Ok(Arc::new(provider))
            }
            None => Ok(Arc::new(HashEmbeddingProvider::new(self.hash_dimensions)?)),
        }
    }

    /// Construct the generation backend.
    ///
    /// # Errors
    ///
    /// Fails if the sampling configuration is invalid.
    pub fn generator(&self) -> Result<Arc<dyn Generator>> {
        if self.offline {
            return Ok(Arc::new(MockGenerator::echo().with_name("offline")));
        }
        let mut generator =
            OpenAICompatibleGenerator::new(&self.generation_url, self.generation.clone())?;
        if let Some(key) = &self.api_key {
            generator = generator.with_api_key(key);
        }
        Ok(Arc::new(generator))
    }

    /// Assemble a pipeline from these backends and `rag`.
    ///
    /// # Errors
    ///
    /// Propagates backend construction and config validation errors.
    pub fn build_pipeline(&self, rag: RagConfig) -> Result<RagPipeline> {
        let embedding_provider = self.embedding_provider()?;
        let generator = self.generator()?;
        info!(
            embedding = embedding_provider.name(),
            generation = generator.name(),
            chunk_size = rag.chunk_size,
            top_k = rag.top_k,
            "pipeline configured"
        );
        RagPipeline::builder()
            .config(rag)
            .embedding_provider(embedding_provider)
            .generator(generator)
            .build()
    }
}

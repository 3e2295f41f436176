//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] answers a question in one call: search the
//! [`Retriever`], render the retrieved passages into a [`PromptTemplate`],
//! hand the prompt to a [`Generator`], and package everything into a
//! [`PipelineResult`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{HashEmbeddingProvider, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
//!     .generator(Arc::new(my_generator))
//!     .build()?;
//!
//! pipeline.ingest(&document_text).await?;
//! let result = pipeline.process("What is the main topic?").await?;
//! println!("{}", result.response);
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, SentenceChunker};
use crate::config::RagConfig;
use crate::document::{PipelineResult, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::index::Retriever;

/// The RAG pipeline orchestrator.
///
/// Holds no state of its own beyond its collaborators; the indexed corpus
/// lives in the shared [`Retriever`]. Construct one via
/// [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    retriever: Arc<Retriever>,
    generator: Arc<dyn Generator>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Return a reference to the generator.
    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    /// Load a document: chunk → embed → replace the index.
    ///
    /// Returns the number of chunks indexed. Text without content clears
    /// the index.
    ///
    /// # Errors
    ///
    /// Propagates embedding and indexing errors from [`Retriever::build`].
    pub async fn ingest(&self, text: &str) -> Result<usize> {
        let chunks = self.chunk(text);
        info!(text_len = text.len(), chunk_count = chunks.len(), "ingesting document");
        self.ingest_chunks(chunks).await
    }

    /// Split `text` with the configured chunker without touching the index.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.chunker.chunk(text)
    }

    /// Replace the index with already chunked passages.
    ///
    /// An empty `chunks` clears the index.
    ///
    /// # Errors
    ///
    /// Propagates embedding and indexing errors from [`Retriever::build`].
    pub async fn ingest_chunks(&self, chunks: Vec<String>) -> Result<usize> {
        self.retriever.build(chunks).await
    }

    /// Answer `query` using the configured default `top_k`.
    ///
    /// # Errors
    ///
    /// See [`process_with_k`](Self::process_with_k).
    pub async fn process(&self, query: &str) -> Result<PipelineResult> {
        self.process_with_k(query, self.config.top_k).await
    }

    /// Answer `query` using the `k` most relevant passages as context.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `k` is zero and
    /// [`RagError::NotIndexed`] if no document is loaded; neither calls a
    /// backend. Embedding, indexing and generation errors propagate
    /// unchanged, with no retry.
    pub async fn process_with_k(&self, query: &str, k: usize) -> Result<PipelineResult> {
        // 1. Retrieve
        let retrieved = self.retriever.search(query, k).await.inspect_err(|e| {
            if !e.is_not_indexed() {
                error!(stage = %e.stage(), error = %e, "retrieval failed");
            }
        })?;

        // 2-3. Assemble the prompt
        let prompt = self.build_prompt(query, &retrieved);

        // 4. Generate
        let response = self.generator.generate(&prompt).await.inspect_err(|e| {
            error!(
                stage = %e.stage(),
                backend = self.generator.name(),
                error = %e,
                "generation failed"
            );
        })?;

        info!(
            k,
            result_count = retrieved.len(),
            prompt_len = prompt.len(),
            response_len = response.len(),
            "query answered"
        );

        // 5. Package
        Ok(PipelineResult { query: query.to_string(), response, retrieved })
    }

    /// Render the prompt that [`process`](Self::process) sends for these results.
    ///
    /// The context is the chunk texts in ranked order, one per line.
    pub fn build_prompt(&self, query: &str, results: &[RetrievalResult]) -> String {
        let context =
            results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n");
        self.config.prompt_template.render(&context, query)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// A generator and either a retriever or an embedding provider are
/// required. The config defaults to [`RagConfig::default()`] and the chunker
/// to a [`SentenceChunker`] sized by `config.chunk_size`.
///
/// # Example
///
/// ```rust,ignore
/// let retriever = Arc::new(Retriever::new(Arc::new(embedder)));
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .retriever(retriever.clone())
///     .generator(Arc::new(generator))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    retriever: Option<Arc<Retriever>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn Generator>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing retriever.
    pub fn retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Create a fresh retriever around this embedding provider.
    ///
    /// Ignored when [`retriever`](Self::retriever) is also set.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation backend.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replace the default sentence chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// the config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let retriever = match (self.retriever, self.embedding_provider) {
            (Some(retriever), _) => retriever,
            (None, Some(provider)) => Arc::new(Retriever::new(provider)),
            (None, None) => {
                return Err(RagError::ConfigError(
                    "retriever or embedding_provider is required".to_string(),
                ));
            }
        };
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(SentenceChunker::new(config.chunk_size)?),
        };

        Ok(RagPipeline { config, retriever, generator, chunker })
    }
}

//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::chunking::DEFAULT_TARGET_SIZE;
use crate::error::{RagError, Result};
use crate::prompt::PromptTemplate;

/// Default number of passages retrieved per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Soft target chunk length in characters.
    pub chunk_size: usize,
    /// Number of passages retrieved when a query does not specify `k`.
    pub top_k: usize,
    /// Template used to assemble the generation prompt.
    pub prompt_template: PromptTemplate,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_TARGET_SIZE,
            top_k: DEFAULT_TOP_K,
            prompt_template: PromptTemplate::default(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size` or `top_k` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
    template: Option<String>,
}

impl RagConfigBuilder {
    /// Set the soft target chunk length in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the default number of passages retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Use a custom prompt template. It is validated by [`build`](Self::build).
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Use an already validated prompt template.
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.config.prompt_template = template;
        self.template = None;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `top_k == 0`
    /// - the prompt template lacks `{context}` or `{query}`
    pub fn build(mut self) -> Result<RagConfig> {
        if let Some(template) = self.template {
            self.config.prompt_template = PromptTemplate::new(template)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }
}

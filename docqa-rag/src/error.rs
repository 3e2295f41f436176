//! Error types for the `docqa-rag` crate.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The pipeline stage that produced an error.
///
/// Presentation layers use this to tell an expected "index not ready"
/// condition apart from a backend fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Splitting raw text into passages.
    Chunking,
    /// Calling the embedding backend.
    Embedding,
    /// Looking up nearest neighbors in the index.
    Search,
    /// Calling the generation backend.
    Generation,
    /// Validating configuration or arguments.
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Chunking => "chunking",
            Stage::Embedding => "embedding",
            Stage::Search => "search",
            Stage::Generation => "generation",
            Stage::Config => "config",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in retrieval and generation.
#[derive(Debug, Error)]
pub enum RagError {
    /// `search` or `process` was called before any document was indexed.
    #[error("no document has been indexed yet")]
    NotIndexed,

    /// The embedding backend failed.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation backend failed.
    #[error("Generation error ({backend}): {message}")]
    GenerationError {
        /// The generator that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An argument was rejected before any backend was called.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Vectors returned by the embedding backend could not be indexed.
    #[error("Index error: {0}")]
    IndexError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Return the stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            RagError::NotIndexed | RagError::IndexError(_) => Stage::Search,
            RagError::EmbeddingError { .. } => Stage::Embedding,
            RagError::GenerationError { .. } => Stage::Generation,
            RagError::InvalidArgument(_) | RagError::ConfigError(_) => Stage::Config,
        }
    }

    /// Whether this is the recoverable "build an index first" condition.
    pub fn is_not_indexed(&self) -> bool {
        matches!(self, RagError::NotIndexed)
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

//! Generator trait for producing answers from prompts.

use async_trait::async_trait;

use crate::error::Result;

/// A backend that turns a prompt into generated text.
///
/// Implementations may sample, so repeated calls with the same prompt can
/// return different text. Failures should be reported as
/// [`RagError::GenerationError`](crate::RagError::GenerationError) with the
/// backend's detail preserved.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::Generator;
///
/// let answer = generator.generate("Context: ...\nQuestion: ...").await?;
/// ```
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// A short name for the backend, used to tag errors and log lines.
    fn name(&self) -> &str;
}

//! Prompt templates combining retrieved context with the user's question.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Placeholder replaced by the retrieved passages.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";
/// Placeholder replaced by the user's question.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Llama-2 chat template instructing the model to answer from context only.
pub const LLAMA2_CHAT_TEMPLATE: &str = "<s>[INST] You are a helpful AI assistant. Use the following context to answer the question. If you cannot find the answer in the context, say so.

Context:
{context}

Question: {query}

Answer: [/INST]";

/// Model-agnostic template for plain completion models.
pub const PLAIN_TEMPLATE: &str = "Context information is below.
---------------------
{context}
---------------------
Given the context information and not prior knowledge, please answer the following question:
{query}

Answer:";

/// A validated prompt template with `{context}` and `{query}` placeholders.
///
/// Rendering is a single pass over the template, so placeholder-like text
/// inside the context or the query is copied through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] unless the template contains both
    /// `{context}` and `{query}`.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUERY_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(RagError::ConfigError(format!(
                    "prompt template must contain {placeholder}"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The Llama-2 chat template (the default).
    pub fn llama2_chat() -> Self {
        Self { template: LLAMA2_CHAT_TEMPLATE.to_string() }
    }

    /// A plain completion-style template.
    pub fn plain() -> Self {
        Self { template: PLAIN_TEMPLATE.to_string() }
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `context` and `query` into the template.
    pub fn render(&self, context: &str, query: &str) -> String {
        let mut prompt = String::with_capacity(self.template.len() + context.len() + query.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            prompt.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
                prompt.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUERY_PLACEHOLDER) {
                prompt.push_str(query);
                rest = after;
            } else {
                prompt.push('{');
                rest = &tail[1..];
            }
        }
        prompt.push_str(rest);
        prompt
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::llama2_chat()
    }
}

impl TryFrom<String> for PromptTemplate {
    type Error = RagError;

    fn try_from(template: String) -> Result<Self> {
        Self::new(template)
    }
}

impl From<PromptTemplate> for String {
    fn from(template: PromptTemplate) -> Self {
        template.template
    }
}

//! Mock generator for tests and offline runs.

use std::sync::Mutex;

use async_trait::async_trait;
use docqa_rag::{Generator, RagError, Result};

#[derive(Debug, Clone)]
enum Reply {
    Canned(String),
    Echo,
    Fail(String),
}

/// A [`Generator`] that returns a fixed reply and records every prompt.
#[derive(Debug)]
pub struct MockGenerator {
    name: String,
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Always answer with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_reply(Reply::Canned(response.into()))
    }

    /// Answer with the prompt itself.
    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    /// Fail every call with a [`RagError::GenerationError`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fail(message.into()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self { name: "mock".to_string(), reply, prompts: Mutex::new(Vec::new()) }
    }

    /// Override the backend name reported in errors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// The number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match &self.reply {
            Reply::Canned(text) => Ok(text.clone()),
            Reply::Echo => Ok(prompt.to_string()),
            Reply::Fail(message) => Err(RagError::GenerationError {
                backend: self.name.clone(),
                message: message.clone(),
            }),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_reply_records_prompts() {
        let generator = MockGenerator::new("42");
        assert_eq!(generator.generate("first").await.unwrap(), "42");
        assert_eq!(generator.generate("second").await.unwrap(), "42");
        assert_eq!(generator.prompts(), vec!["first", "second"]);
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn echo_returns_prompt() {
        let generator = MockGenerator::echo();
        assert_eq!(generator.generate("ping").await.unwrap(), "ping");
    }

    #[tokio::test]
    async fn failing_reports_backend_name() {
        let generator = MockGenerator::failing("offline").with_name("llama");
        let err = generator.generate("ping").await.unwrap_err();
        assert_eq!(err.to_string(), "Generation error (llama): offline");
        assert_eq!(generator.call_count(), 1);
    }
}

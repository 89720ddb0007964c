//! Free-text answer enhancement.

use std::sync::Arc;

use crate::client::{GenerationRequest, GenerativeClient};
use crate::error::AiError;
use crate::prompts;

pub struct FieldEnhancer {
    client: Arc<dyn GenerativeClient>,
}

impl FieldEnhancer {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    /// Rephrase one survey answer into a polished single paragraph. Plain
    /// text in, plain text out; blank provider output is a failure. The
    /// caller persists the replacement.
    pub async fn enhance(&self, answer: &str, question: &str) -> Result<String, AiError> {
        let prompt = prompts::enhancement_prompt(question, answer);
        let text = self.client.generate(GenerationRequest::plain(prompt)).await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

//! Schema-constrained structured generation.
//!
//! Single choke point: every structured AI response is produced here, so
//! every consumer gets the same validation discipline. No retries; callers
//! decide whether to re-request.

use std::sync::Arc;

use guidepost_core::shape::{validate, Shape};
use serde_json::Value;
use tracing::debug;

use crate::client::{GenerationRequest, GenerativeClient};
use crate::error::AiError;
use crate::prompts;

pub struct StructuredContentGenerator {
    client: Arc<dyn GenerativeClient>,
}

impl StructuredContentGenerator {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    /// Run one schema-constrained generation and return the validated JSON.
    ///
    /// Empty provider text fails with [`AiError::EmptyResponse`] before any
    /// parse attempt; text that does not parse or does not match `shape`
    /// fails as a schema violation.
    pub async fn generate(
        &self,
        question: &str,
        input: &str,
        schema: Value,
        shape: &Shape,
    ) -> Result<Value, AiError> {
        let prompt = prompts::structured_generation_prompt(question, input, &schema);
        self.generate_with_prompt(prompt, schema, shape).await
    }

    /// Run a caller-composed prompt under the same schema constraint and
    /// validation discipline, without the standard wrapper text.
    pub async fn generate_with_prompt(
        &self,
        prompt: String,
        schema: Value,
        shape: &Shape,
    ) -> Result<Value, AiError> {
        let text =
            self.client.generate(GenerationRequest::structured(prompt, schema)).await?;

        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }

        let cleaned = strip_code_fences(&text);
        let value: Value = serde_json::from_str(cleaned).map_err(AiError::MalformedJson)?;
        validate(&value, shape)?;

        debug!(event_name = "ai.structured.validated", "structured response passed validation");
        Ok(value)
    }
}

/// Models occasionally wrap JSON in a markdown fence even when asked not
/// to. Strip a leading ```/```json and trailing ``` pair before parsing.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use guidepost_core::shape::Shape;
    use serde_json::json;

    use super::{strip_code_fences, StructuredContentGenerator};
    use crate::client::{GenerationRequest, GenerativeClient};
    use crate::error::AiError;

    struct ScriptedClient {
        response: Result<String, AiError>,
    }

    #[async_trait]
    impl GenerativeClient for ScriptedClient {
        async fn generate(&self, _request: GenerationRequest) -> Result<String, AiError> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(AiError::EmptyResponse),
            }
        }
    }

    fn generator(response: &str) -> StructuredContentGenerator {
        StructuredContentGenerator::new(Arc::new(ScriptedClient {
            response: Ok(response.to_string()),
        }))
    }

    fn shape() -> Shape {
        Shape::object(vec![("overview", Shape::Text)])
    }

    #[tokio::test]
    async fn returns_validated_json() {
        let value = generator("{\"overview\": \"Acme makes anvils.\"}")
            .generate("q", "input", json!({"type": "object"}), &shape())
            .await
            .expect("valid structured response");

        assert_eq!(value["overview"], "Acme makes anvils.");
    }

    #[tokio::test]
    async fn empty_text_fails_before_parsing() {
        let error = generator("   ")
            .generate("q", "input", json!({"type": "object"}), &shape())
            .await
            .expect_err("empty text is a provider failure");

        assert!(matches!(error, AiError::EmptyResponse));
    }

    #[tokio::test]
    async fn unparseable_text_is_a_schema_violation() {
        let error = generator("this is not json")
            .generate("q", "input", json!({"type": "object"}), &shape())
            .await
            .expect_err("non-JSON text");

        assert!(error.is_schema_violation());
        assert!(matches!(error, AiError::MalformedJson(_)));
    }

    #[tokio::test]
    async fn shape_mismatch_is_a_schema_violation() {
        let error = generator("{\"summary\": \"wrong field\"}")
            .generate("q", "input", json!({"type": "object"}), &shape())
            .await
            .expect_err("missing required field");

        assert!(error.is_schema_violation());
        assert!(error.to_string().contains("missing required field `overview`"));
    }

    #[tokio::test]
    async fn fenced_json_is_unwrapped() {
        let value = generator("```json\n{\"overview\": \"fenced\"}\n```")
            .generate("q", "input", json!({"type": "object"}), &shape())
            .await
            .expect("fenced JSON parses");

        assert_eq!(value["overview"], "fenced");
    }

    #[test]
    fn fence_stripping_leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }
}

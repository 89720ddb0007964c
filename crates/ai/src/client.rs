//! Gemini-style text generation client.

use std::time::Duration;

use async_trait::async_trait;
use guidepost_core::config::GeminiConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::AiError;

/// One generation call: a literal prompt plus generation parameters and an
/// optional JSON schema constraint on the response.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub prompt: String,
    pub response_schema: Option<Value>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl GenerationRequest {
    pub fn plain(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
            temperature: 0.7,
            max_output_tokens: 2048,
            top_p: 0.8,
            top_k: 40,
        }
    }

    pub fn structured(prompt: impl Into<String>, schema: Value) -> Self {
        Self { response_schema: Some(schema), ..Self::plain(prompt) }
    }
}

/// The seam every AI-backed feature calls through. Implemented by
/// [`GeminiClient`] in production and by scripted fakes in tests.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError>;
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequestBody {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseBody {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn from_config(config: &GeminiConfig) -> Result<Self, AiError> {
        let api_key = config.api_key.clone().ok_or(AiError::MissingApiKey)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(AiError::Http)?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError> {
        let response_mime_type = request.response_schema.is_some().then_some("application/json");
        let body = GeminiRequestBody {
            contents: vec![GeminiContent { parts: vec![GeminiPart { text: request.prompt }] }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                top_p: request.top_p,
                top_k: request.top_k,
                response_mime_type,
                response_schema: request.response_schema,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            self.api_key.expose_secret()
        );
        debug!(
            event_name = "ai.gemini.request",
            model = %self.model,
            url = %url.replace(self.api_key.expose_secret(), "***"),
            "sending generation request"
        );

        let response = self.http.post(&url).json(&body).send().await.map_err(AiError::Http)?;

        let status = response.status();
        let response_text = response.text().await.map_err(AiError::Http)?;
        if !status.is_success() {
            error!(
                event_name = "ai.gemini.error",
                status = status.as_u16(),
                "generation request failed"
            );
            return Err(AiError::Api { status: status.as_u16(), body: response_text });
        }

        let parsed: GeminiResponseBody = serde_json::from_str(&response_text)
            .map_err(|e| AiError::InvalidResponse(format!("unparseable provider body: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AiError::InvalidResponse("no candidates in response".to_string()))?;
        let part = candidate
            .content
            .parts
            .into_iter()
            .next()
            .ok_or_else(|| AiError::InvalidResponse("no parts in candidate".to_string()))?;

        Ok(part.text)
    }
}

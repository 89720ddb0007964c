use guidepost_core::shape::ShapeViolation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("provider api key is not configured")]
    MissingApiKey,
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("provider response was malformed: {0}")]
    InvalidResponse(String),
    #[error("provider returned empty text")]
    EmptyResponse,
    #[error("generated text was not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error(transparent)]
    Shape(#[from] ShapeViolation),
    #[error("image job `{job_id}` did not reach a terminal state within {attempts} attempts")]
    PollTimeout { job_id: String, attempts: u32 },
    #[error("image job failed: {0}")]
    JobFailed(String),
}

impl AiError {
    /// True when the failure is the generator's output shape rather than
    /// the provider call itself.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Self::MalformedJson(_) | Self::Shape(_))
    }
}

//! Portrait generation jobs.
//!
//! The image provider is job-based: create a prediction, then poll its
//! status until it reaches a terminal state. The source of this behavior
//! polled forever; here the loop is bounded by [`PollPolicy`] and
//! exhaustion surfaces as [`AiError::PollTimeout`] so callers can fall
//! back to a placeholder portrait.

use std::time::Duration;

use async_trait::async_trait;
use guidepost_core::config::ImageConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::AiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImageJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ImageJob {
    /// The provider returns either a bare URL string or an array of URLs.
    pub fn output_url(&self) -> Option<String> {
        match &self.output {
            Some(Value::String(url)) => Some(url.clone()),
            Some(Value::Array(urls)) => {
                urls.first().and_then(Value::as_str).map(str::to_string)
            }
            _ => None,
        }
    }
}

#[async_trait]
pub trait ImageJobClient: Send + Sync {
    async fn create_portrait_job(&self, prompt: &str) -> Result<ImageJob, AiError>;

    async fn job_status(&self, job_id: &str) -> Result<ImageJob, AiError>;
}

#[derive(Clone, Debug)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_poll_attempts.max(1),
        }
    }
}

/// Create a portrait job and poll it to a terminal state, returning the
/// image URL. Fixed-interval spacing between status checks; the attempt
/// cap turns a stuck job into a timeout instead of an unbounded hang.
pub async fn await_portrait_url(
    client: &dyn ImageJobClient,
    prompt: &str,
    policy: &PollPolicy,
) -> Result<String, AiError> {
    let mut job = client.create_portrait_job(prompt).await?;
    let mut attempts: u32 = 0;

    while !job.status.is_terminal() {
        if attempts >= policy.max_attempts {
            return Err(AiError::PollTimeout { job_id: job.id, attempts });
        }
        tokio::time::sleep(policy.interval).await;
        attempts += 1;
        job = client.job_status(&job.id).await?;
        debug!(
            event_name = "ai.image.poll",
            job_id = %job.id,
            attempt = attempts,
            "image job status checked"
        );
    }

    match job.status {
        JobStatus::Succeeded => job
            .output_url()
            .ok_or_else(|| AiError::JobFailed("succeeded without an output URL".to_string())),
        _ => Err(AiError::JobFailed(
            job.error.unwrap_or_else(|| "job ended without a result".to_string()),
        )),
    }
}

#[derive(Clone, Debug)]
pub struct ReplicateClient {
    http: Client,
    api_token: SecretString,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    raw: bool,
    prompt: &'a str,
    aspect_ratio: &'a str,
    output_format: &'a str,
    safety_tolerance: u8,
    image_prompt_strength: f32,
}

impl ReplicateClient {
    pub fn from_config(config: &ImageConfig) -> Result<Self, AiError> {
        let api_token = config.api_token.clone().ok_or(AiError::MissingApiKey)?;
        let http = Client::builder().build().map_err(AiError::Http)?;

        Ok(Self {
            http,
            api_token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    async fn decode_job(response: reqwest::Response) -> Result<ImageJob, AiError> {
        let status = response.status();
        let body = response.text().await.map_err(AiError::Http)?;
        if !status.is_success() {
            return Err(AiError::Api { status: status.as_u16(), body });
        }
        serde_json::from_str(&body)
            .map_err(|e| AiError::InvalidResponse(format!("unparseable prediction body: {e}")))
    }
}

#[async_trait]
impl ImageJobClient for ReplicateClient {
    async fn create_portrait_job(&self, prompt: &str) -> Result<ImageJob, AiError> {
        let request = PredictionRequest {
            version: &self.model,
            input: PredictionInput {
                raw: false,
                prompt,
                aspect_ratio: "1:1",
                output_format: "jpg",
                safety_tolerance: 6,
                image_prompt_strength: 0.1,
            },
        };

        let response = self
            .http
            .post(format!("{}/v1/predictions", self.base_url))
            .bearer_auth(self.api_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(AiError::Http)?;

        Self::decode_job(response).await
    }

    async fn job_status(&self, job_id: &str) -> Result<ImageJob, AiError> {
        let response = self
            .http
            .get(format!("{}/v1/predictions/{}", self.base_url, job_id))
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await
            .map_err(AiError::Http)?;

        Self::decode_job(response).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::{await_portrait_url, ImageJob, ImageJobClient, JobStatus, PollPolicy};
    use crate::error::AiError;

    struct ScriptedJobClient {
        pending_rounds: u32,
        terminal: JobStatus,
        output: Option<serde_json::Value>,
        polls: AtomicU32,
    }

    impl ScriptedJobClient {
        fn new(pending_rounds: u32, terminal: JobStatus, output: Option<serde_json::Value>) -> Self {
            Self { pending_rounds, terminal, output, polls: AtomicU32::new(0) }
        }
    }

    #[async_trait]
    impl ImageJobClient for ScriptedJobClient {
        async fn create_portrait_job(&self, _prompt: &str) -> Result<ImageJob, AiError> {
            Ok(ImageJob {
                id: "job-1".to_string(),
                status: JobStatus::Starting,
                output: None,
                error: None,
            })
        }

        async fn job_status(&self, job_id: &str) -> Result<ImageJob, AiError> {
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            let status =
                if polls >= self.pending_rounds { self.terminal } else { JobStatus::Processing };
            Ok(ImageJob {
                id: job_id.to_string(),
                status,
                output: if status == JobStatus::Succeeded { self.output.clone() } else { None },
                error: None,
            })
        }
    }

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy { interval: Duration::from_millis(1), max_attempts }
    }

    #[tokio::test]
    async fn polls_until_success_and_returns_the_url() {
        let client = ScriptedJobClient::new(
            3,
            JobStatus::Succeeded,
            Some(json!("https://img.example.com/portrait.jpg")),
        );

        let url = await_portrait_url(&client, "portrait", &fast_policy(10))
            .await
            .expect("job succeeds");
        assert_eq!(url, "https://img.example.com/portrait.jpg");
        assert_eq!(client.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn array_output_takes_the_first_url() {
        let client = ScriptedJobClient::new(
            1,
            JobStatus::Succeeded,
            Some(json!(["https://img.example.com/a.jpg", "https://img.example.com/b.jpg"])),
        );

        let url =
            await_portrait_url(&client, "portrait", &fast_policy(5)).await.expect("job succeeds");
        assert_eq!(url, "https://img.example.com/a.jpg");
    }

    #[tokio::test]
    async fn a_job_that_never_terminates_times_out_at_the_attempt_cap() {
        let client = ScriptedJobClient::new(u32::MAX, JobStatus::Succeeded, None);

        let error = await_portrait_url(&client, "portrait", &fast_policy(4))
            .await
            .expect_err("bounded poll loop");
        assert!(matches!(error, AiError::PollTimeout { attempts: 4, .. }));
        assert_eq!(client.polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn failed_jobs_surface_the_provider_error() {
        let client = ScriptedJobClient::new(2, JobStatus::Failed, None);

        let error =
            await_portrait_url(&client, "portrait", &fast_policy(10)).await.expect_err("failed");
        assert!(matches!(error, AiError::JobFailed(_)));
    }

    #[test]
    fn terminal_statuses_are_exactly_the_three_end_states() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
        assert!(!JobStatus::Starting.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }
}

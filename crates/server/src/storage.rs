//! Tenant-scoped blob storage and the placeholder avatar fallback.

use guidepost_core::config::StorageConfig;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

/// Object-store client: upsert-by-overwrite uploads under a tenant-scoped
/// path, addressed afterwards by a public URL.
#[derive(Clone, Debug)]
pub struct BlobStore {
    http: Client,
    base_url: String,
    bucket: String,
    api_key: SecretString,
}

impl BlobStore {
    /// `None` when no storage credential is configured; callers then use
    /// the placeholder avatar path.
    pub fn from_config(config: &StorageConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            api_key,
        })
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
    }

    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        debug!(event_name = "storage.upload", path = %path, bytes = bytes.len(), "uploading blob");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api { status: status.as_u16(), body });
        }

        Ok(self.public_url(path))
    }
}

/// Deterministic placeholder portrait keyed by the persona's name, used
/// whenever image generation or upload fails.
pub fn placeholder_avatar_url(name: &str) -> String {
    Url::parse_with_params(
        "https://ui-avatars.com/api/",
        &[
            ("name", name),
            ("background", "2563eb"),
            ("color", "ffffff"),
            ("size", "256"),
            ("bold", "true"),
            ("rounded", "true"),
        ],
    )
    .map(String::from)
    .unwrap_or_else(|_| "https://ui-avatars.com/api/?name=Customer".to_string())
}

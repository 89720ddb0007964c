use std::sync::Arc;

use guidepost_ai::{GeminiClient, GenerativeClient, ImageJobClient, PollPolicy, ReplicateClient};
use guidepost_core::config::{ChatConfig, ConfigError, GuidepostConfig, LoadOptions};
use guidepost_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::storage::BlobStore;

/// Process-wide shared handles, cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub generative: Arc<dyn GenerativeClient>,
    pub image: Option<Arc<dyn ImageJobClient>>,
    pub blobs: Option<Arc<BlobStore>>,
    pub http: reqwest::Client,
    pub chat: ChatConfig,
    pub poll: PollPolicy,
}

pub struct Application {
    pub config: GuidepostConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("generative client setup failed: {0}")]
    Generative(#[source] guidepost_ai::AiError),
    #[error("http client setup failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = GuidepostConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: GuidepostConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let generative: Arc<dyn GenerativeClient> =
        Arc::new(GeminiClient::from_config(&config.gemini).map_err(BootstrapError::Generative)?);

    // Image generation and blob storage degrade to the placeholder-avatar
    // path when their credentials are absent.
    let image: Option<Arc<dyn ImageJobClient>> = match ReplicateClient::from_config(&config.image)
    {
        Ok(client) => Some(Arc::new(client)),
        Err(_) => {
            info!(
                event_name = "system.bootstrap.image_disabled",
                "image provider token absent, portraits fall back to placeholders"
            );
            None
        }
    };
    let blobs = BlobStore::from_config(&config.storage).map(Arc::new);

    let http = reqwest::Client::builder().build().map_err(BootstrapError::HttpClient)?;

    let state = AppState {
        db_pool,
        generative,
        image,
        blobs,
        http,
        chat: config.chat.clone(),
        poll: PollPolicy::from_config(&config.image),
    };

    Ok(Application { config, state })
}

#[cfg(test)]
mod tests {
    use guidepost_core::config::{ConfigOverrides, LoadOptions};

    use super::{bootstrap, BootstrapError};

    fn options(gemini_api_key: Option<&str>) -> LoadOptions {
        LoadOptions {
            config_path: Some(std::path::PathBuf::from("does-not-exist.toml")),
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                gemini_api_key: gemini_api_key.map(str::to_string),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_a_generative_api_key() {
        let result = bootstrap(options(None)).await;
        assert!(matches!(result, Err(BootstrapError::Generative(_))));
    }

    #[tokio::test]
    async fn bootstrap_prepares_schema_and_state() {
        let app = bootstrap(options(Some("test-key"))).await.expect("bootstrap succeeds");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN
                ('tenants', 'company_profiles', 'target_markets', 'target_customers', 'chat_history')",
        )
        .fetch_one(&app.state.db_pool)
        .await
        .expect("baseline tables present");
        assert_eq!(table_count, 5);

        assert!(app.state.image.is_none(), "no image token configured");
        assert!(app.state.blobs.is_none(), "no storage key configured");

        app.state.db_pool.close().await;
    }
}

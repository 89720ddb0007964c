use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct GuidepostConfig {
    pub database: DatabaseConfig,
    pub gemini: GeminiConfig,
    pub image: ImageConfig,
    pub storage: StorageConfig,
    pub chat: ChatConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ImageConfig {
    pub api_token: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub base_url: String,
    pub bucket: String,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub webhook_url: String,
    pub no_reply_text: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub image_api_token: Option<String>,
    pub storage_api_key: Option<String>,
    pub chat_webhook_url: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for GuidepostConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://guidepost.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            gemini: GeminiConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-2.0-pro-exp-02-05".to_string(),
                timeout_secs: 60,
            },
            image: ImageConfig {
                api_token: None,
                base_url: "https://api.replicate.com".to_string(),
                model: "black-forest-labs/flux-1.1-pro-ultra".to_string(),
                poll_interval_ms: 1000,
                max_poll_attempts: 120,
            },
            storage: StorageConfig {
                base_url: "http://localhost:54321".to_string(),
                bucket: "profile-images".to_string(),
                api_key: None,
            },
            chat: ChatConfig {
                webhook_url: "http://localhost:5678/webhook/guidepost-chat".to_string(),
                no_reply_text: "No response received from the workflow.".to_string(),
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl GuidepostConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("guidepost.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(gemini) = patch.gemini {
            if let Some(gemini_api_key_value) = gemini.api_key {
                self.gemini.api_key = Some(secret_value(gemini_api_key_value));
            }
            if let Some(base_url) = gemini.base_url {
                self.gemini.base_url = base_url;
            }
            if let Some(model) = gemini.model {
                self.gemini.model = model;
            }
            if let Some(timeout_secs) = gemini.timeout_secs {
                self.gemini.timeout_secs = timeout_secs;
            }
        }

        if let Some(image) = patch.image {
            if let Some(image_api_token_value) = image.api_token {
                self.image.api_token = Some(secret_value(image_api_token_value));
            }
            if let Some(base_url) = image.base_url {
                self.image.base_url = base_url;
            }
            if let Some(model) = image.model {
                self.image.model = model;
            }
            if let Some(poll_interval_ms) = image.poll_interval_ms {
                self.image.poll_interval_ms = poll_interval_ms;
            }
            if let Some(max_poll_attempts) = image.max_poll_attempts {
                self.image.max_poll_attempts = max_poll_attempts;
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(base_url) = storage.base_url {
                self.storage.base_url = base_url;
            }
            if let Some(bucket) = storage.bucket {
                self.storage.bucket = bucket;
            }
            if let Some(storage_api_key_value) = storage.api_key {
                self.storage.api_key = Some(secret_value(storage_api_key_value));
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(webhook_url) = chat.webhook_url {
                self.chat.webhook_url = webhook_url;
            }
            if let Some(no_reply_text) = chat.no_reply_text {
                self.chat.no_reply_text = no_reply_text;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("GUIDEPOST_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("GUIDEPOST_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("GUIDEPOST_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("GUIDEPOST_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("GUIDEPOST_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GUIDEPOST_GEMINI_API_KEY") {
            self.gemini.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("GUIDEPOST_GEMINI_BASE_URL") {
            self.gemini.base_url = value;
        }
        if let Some(value) = read_env("GUIDEPOST_GEMINI_MODEL") {
            self.gemini.model = value;
        }
        if let Some(value) = read_env("GUIDEPOST_GEMINI_TIMEOUT_SECS") {
            self.gemini.timeout_secs = parse_u64("GUIDEPOST_GEMINI_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GUIDEPOST_IMAGE_API_TOKEN") {
            self.image.api_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("GUIDEPOST_IMAGE_BASE_URL") {
            self.image.base_url = value;
        }
        if let Some(value) = read_env("GUIDEPOST_IMAGE_MODEL") {
            self.image.model = value;
        }
        if let Some(value) = read_env("GUIDEPOST_IMAGE_POLL_INTERVAL_MS") {
            self.image.poll_interval_ms = parse_u64("GUIDEPOST_IMAGE_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = read_env("GUIDEPOST_IMAGE_MAX_POLL_ATTEMPTS") {
            self.image.max_poll_attempts =
                parse_u32("GUIDEPOST_IMAGE_MAX_POLL_ATTEMPTS", &value)?;
        }

        if let Some(value) = read_env("GUIDEPOST_STORAGE_BASE_URL") {
            self.storage.base_url = value;
        }
        if let Some(value) = read_env("GUIDEPOST_STORAGE_BUCKET") {
            self.storage.bucket = value;
        }
        if let Some(value) = read_env("GUIDEPOST_STORAGE_API_KEY") {
            self.storage.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("GUIDEPOST_CHAT_WEBHOOK_URL") {
            self.chat.webhook_url = value;
        }
        if let Some(value) = read_env("GUIDEPOST_CHAT_NO_REPLY_TEXT") {
            self.chat.no_reply_text = value;
        }

        if let Some(value) = read_env("GUIDEPOST_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("GUIDEPOST_SERVER_PORT") {
            self.server.port = parse_u16("GUIDEPOST_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("GUIDEPOST_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("GUIDEPOST_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(gemini_api_key_value) = overrides.gemini_api_key {
            self.gemini.api_key = Some(secret_value(gemini_api_key_value));
        }
        if let Some(model) = overrides.gemini_model {
            self.gemini.model = model;
        }
        if let Some(image_api_token_value) = overrides.image_api_token {
            self.image.api_token = Some(secret_value(image_api_token_value));
        }
        if let Some(storage_api_key_value) = overrides.storage_api_key {
            self.storage.api_key = Some(secret_value(storage_api_key_value));
        }
        if let Some(webhook_url) = overrides.chat_webhook_url {
            self.chat.webhook_url = webhook_url;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.gemini.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("gemini.base_url must not be empty".to_string()));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(ConfigError::Validation("gemini.model must not be empty".to_string()));
        }
        if self.image.max_poll_attempts == 0 {
            return Err(ConfigError::Validation(
                "image.max_poll_attempts must be at least 1".to_string(),
            ));
        }
        if !self.chat.webhook_url.starts_with("http://")
            && !self.chat.webhook_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "chat.webhook_url must be an http(s) URL, got `{}`",
                self.chat.webhook_url
            )));
        }
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.bind_address must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let default = PathBuf::from("guidepost.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    gemini: Option<GeminiPatch>,
    image: Option<ImagePatch>,
    storage: Option<StoragePatch>,
    chat: Option<ChatPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ImagePatch {
    api_token: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    poll_interval_ms: Option<u64>,
    max_poll_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    base_url: Option<String>,
    bucket: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    webhook_url: Option<String>,
    no_reply_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{ConfigError, ConfigOverrides, GuidepostConfig, LoadOptions, LogFormat};

    fn options_without_file() -> LoadOptions {
        LoadOptions {
            config_path: Some(std::path::PathBuf::from("does-not-exist.toml")),
            ..LoadOptions::default()
        }
    }

    #[test]
    fn defaults_validate() {
        let config =
            GuidepostConfig::load(options_without_file()).expect("defaults should validate");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.image.poll_interval_ms, 1000);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[database]
url = "sqlite://custom.db"
max_connections = 9

[chat]
webhook_url = "https://flows.example.com/hook"

[logging]
level = "debug"
format = "json"
"#
        )
        .expect("write config");

        let config = GuidepostConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            ..LoadOptions::default()
        })
        .expect("load patched config");

        assert_eq!(config.database.url, "sqlite://custom.db");
        assert_eq!(config.database.max_connections, 9);
        assert_eq!(config.chat.webhook_url, "https://flows.example.com/hook");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = GuidepostConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                chat_webhook_url: Some("https://hooks.example.com/chat".to_string()),
                ..ConfigOverrides::default()
            },
            ..options_without_file()
        })
        .expect("load with overrides");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.chat.webhook_url, "https://hooks.example.com/chat");
    }

    #[test]
    fn rejects_non_http_webhook_url() {
        let result = GuidepostConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                chat_webhook_url: Some("ftp://flows.example.com".to_string()),
                ..ConfigOverrides::default()
            },
            ..options_without_file()
        });

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn missing_required_file_is_reported() {
        let result = GuidepostConfig::load(LoadOptions {
            config_path: Some(std::path::PathBuf::from("missing-guidepost.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }
}

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use docchat_client::ClientConfig;
use docchat_sync::SyncSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Overrides `api.base_url` when set
pub const API_URL_VAR: &str = "DOCCHAT_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Applies to plain requests only; chat streams never time out
    pub request_timeout_secs: Option<u64>,
    pub identity_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            base_url: client.base_url,
            request_timeout_secs: Some(30),
            identity_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `DOCCHAT_` variables, sections split by `__` (`DOCCHAT_SYNC__SETTLE_MS`)
    /// 4. `DOCCHAT_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("DOCCHAT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: CliConfig = config.try_deserialize()?;

        if let Ok(url) = std::env::var(API_URL_VAR) {
            cfg.api.base_url = url;
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new(self.api.base_url.clone());
        client.request_timeout_secs = self.api.request_timeout_secs;
        client.identity_path = self.api.identity_path.clone();
        client
    }
}

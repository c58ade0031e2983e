use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Connection settings for [`ApiClient`](crate::ApiClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    /// Timeout for plain request/response calls. Chat streams are never timed out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Where the signed-in identity is cached between runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_path: Option<PathBuf>,
    #[serde(default = "default_login_route")]
    pub login_route: String,
}

fn default_user_agent() -> String {
    format!("docchat-client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            user_agent: default_user_agent(),
            identity_path: None,
            login_route: default_login_route(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn with_identity_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_path = Some(path.into());
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Check the base URL and return it without a trailing slash
    pub fn normalized_base_url(&self) -> Result<String> {
        let parsed = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "Unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        Ok(self.base_url.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.login_route, "/login");
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_trailing_slash_removed() {
        let config = ClientConfig::new("https://api.example.com/");
        assert_eq!(config.normalized_base_url().unwrap(), "https://api.example.com");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ClientConfig::new("not a url").normalized_base_url().is_err());
        assert!(ClientConfig::new("ftp://example.com").normalized_base_url().is_err());
    }

    #[test]
    fn test_serde_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"base_url":"http://127.0.0.1:9000"}"#).unwrap();
        assert!(config.user_agent.starts_with("docchat-client/"));
        assert!(config.identity_path.is_none());
    }
}

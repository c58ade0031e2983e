use std::sync::Arc;

use docchat_client::{ApiClient, ClientConfig, Session};

use crate::context::AppContext;
use crate::error::Result;
use crate::notice::Notifier;
use crate::settings::SyncSettings;

pub struct AppContextBuilder {
    client_config: ClientConfig,
    settings: SyncSettings,
    session: Option<Arc<Session>>,
    notifier: Option<Notifier>,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self {
            client_config: ClientConfig::default(),
            settings: SyncSettings::default(),
            session: None,
            notifier: None,
        }
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client_config.base_url = base_url.into();
        self
    }

    pub fn settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Reuse an existing identity session
    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Result<AppContext> {
        let mut client = ApiClient::builder().config(self.client_config);
        if let Some(session) = self.session {
            client = client.session(session);
        }
        let client = client.build()?;

        Ok(AppContext::new(
            client,
            self.settings,
            self.notifier.unwrap_or_default(),
        ))
    }
}

impl Default for AppContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::Arc;
use std::time::Duration;

use docchat_types::{ChatData, Thread};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::buffer_utils::parse_chat_stream;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::streaming::EventStream;

/// HTTP client for the document-chat API
///
/// Every call goes through one send path, so an HTTP 401 from any endpoint
/// invalidates the shared [`Session`] before the error reaches the caller.
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    request_timeout: Option<Duration>,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client with its own session
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request with the configured timeout applied
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http_client.request(method, self.url(path));
        match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Send a request and reject anything but a success status
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("{} {}", status.as_u16(), response.url().path());

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Session rejected by server; login required");
            self.session.invalidate().await;
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let message = error_message(response).await;
            return Err(ClientError::Protocol { status, message });
        }

        Ok(response)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(format!("Failed to parse response: {}", e)))
    }

    /// Send and discard whatever acknowledgement body comes back
    pub(crate) async fn send_ack(&self, builder: RequestBuilder) -> Result<()> {
        let response = self.send(builder).await?;
        let _ = response.bytes().await?;
        Ok(())
    }

    /// Start a chat turn and return the live streaming response
    ///
    /// No timeout is applied: a hung connection holds the turn until the
    /// transport itself fails.
    pub async fn start_chat(&self, thread_id: &str, message: &str) -> Result<Response> {
        require_id(thread_id, "thread id")?;
        if message.trim().is_empty() {
            return Err(ClientError::InvalidInput("message must not be empty".to_string()));
        }

        let builder = self
            .http_client
            .post(self.url(&format!("/thread/{}/chat", thread_id)))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&ChatData {
                message: message.to_string(),
            });

        tracing::debug!("Starting chat turn on thread {}", thread_id);
        self.send(builder).await
    }

    /// Start a chat turn and decode its body into events
    pub async fn chat_stream(&self, thread_id: &str, message: &str) -> Result<EventStream> {
        let response = self.start_chat(thread_id, message).await?;
        Ok(parse_chat_stream(response))
    }
}

#[async_trait::async_trait]
impl crate::traits::ChatApi for ApiClient {
    async fn chat_stream(&self, thread_id: &str, message: &str) -> Result<EventStream> {
        ApiClient::chat_stream(self, thread_id, message).await
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        self.get_thread(thread_id).await
    }
}

pub(crate) fn require_id(id: &str, what: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ClientError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Best human-readable message from an error body
async fn error_message(response: Response) -> String {
    let reason = response
        .status()
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string();

    match response.json::<Value>().await {
        Ok(body) => message_from_body(&body).unwrap_or(reason),
        Err(_) => reason,
    }
}

pub(crate) fn message_from_body(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(detail)) => return Some(detail.clone()),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ");
            if !joined.is_empty() {
                return Some(joined);
            }
        }
        _ => {}
    }
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    session: Option<Arc<Session>>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.base_url = base_url.into();
        self.config = Some(config);
        self
    }

    /// Share a session with other clients or front-end state
    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let config = self.config.unwrap_or_default();
        let base_url = config.normalized_base_url()?;

        let session = match self.session {
            Some(session) => session,
            None => Arc::new(match &config.identity_path {
                Some(path) => Session::with_identity_file(config.login_route.clone(), path),
                None => Session::new(config.login_route.clone()),
            }),
        };

        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(ApiClient {
            http_client,
            base_url,
            request_timeout: config.request_timeout(),
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::builder().base_url("http://localhost:8000/").build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/folder/"), "http://localhost:8000/folder/");
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        assert!(ApiClient::builder().base_url("::nope").build().is_err());
    }

    #[test]
    fn test_message_from_detail_string() {
        let body = json!({"detail": "Folder not found"});
        assert_eq!(message_from_body(&body).as_deref(), Some("Folder not found"));
    }

    #[test]
    fn test_message_from_validation_errors() {
        let body = json!({"detail": [{"msg": "field required"}, {"msg": "too short"}]});
        assert_eq!(message_from_body(&body).as_deref(), Some("field required, too short"));
    }

    #[test]
    fn test_message_fallback() {
        assert_eq!(message_from_body(&json!({"message": "nope"})).as_deref(), Some("nope"));
        assert_eq!(message_from_body(&json!({"other": 1})), None);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_before_request() {
        let client = ApiClient::builder().build().unwrap();
        let err = client.start_chat("t1", "   ").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));

        let err = client.start_chat("", "hello").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}

use docchat_types::thread::{ThreadEnvelope, ThreadListEnvelope};
use docchat_types::{CreateThreadData, CreateThreadResponse, Thread, UpdateThreadData, UpdateThreadResponse};
use reqwest::{Method, StatusCode};

use crate::client::{require_id, ApiClient};
use crate::error::{ClientError, Result};

impl ApiClient {
    /// `GET /thread/{id}`; a missing thread (or an empty id) is `None`
    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        if thread_id.trim().is_empty() {
            return Ok(None);
        }

        let request = self.request(Method::GET, &format!("/thread/{}", thread_id));
        match self.send_json::<ThreadEnvelope>(request).await {
            Ok(envelope) => {
                tracing::debug!(
                    "Fetched thread {} ({} messages)",
                    thread_id,
                    envelope.thread.as_ref().map_or(0, |t| t.messages.len())
                );
                Ok(envelope.thread)
            }
            Err(ClientError::Protocol { status, .. }) if status == StatusCode::NOT_FOUND => {
                tracing::debug!("Thread {} not found", thread_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// `GET /thread/all?folder_id=`
    pub async fn folder_threads(&self, folder_id: &str) -> Result<Vec<Thread>> {
        if folder_id.trim().is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .request(Method::GET, "/thread/all")
            .query(&[("folder_id", folder_id)]);
        let envelope: ThreadListEnvelope = self.send_json(request).await?;
        Ok(envelope.threads)
    }

    /// `GET /thread/recent/all`; each thread carries its folder name
    pub async fn recent_threads(&self) -> Result<Vec<Thread>> {
        let envelope: ThreadListEnvelope = self
            .send_json(self.request(Method::GET, "/thread/recent/all"))
            .await?;
        Ok(envelope.threads)
    }

    pub async fn create_thread(&self, data: &CreateThreadData) -> Result<CreateThreadResponse> {
        require_id(&data.folder_id, "folder id")?;
        let request = self.request(Method::POST, "/thread/").json(data);
        self.send_json(request).await
    }

    pub async fn update_thread(&self, data: &UpdateThreadData) -> Result<UpdateThreadResponse> {
        require_id(&data.thread_id, "thread id")?;
        let request = self
            .request(Method::PUT, &format!("/thread/{}", data.thread_id))
            .json(&serde_json::json!({ "new_name": data.new_name }));
        self.send_json(request).await
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        require_id(thread_id, "thread id")?;
        self.send_ack(self.request(Method::DELETE, &format!("/thread/{}", thread_id)))
            .await
    }
}

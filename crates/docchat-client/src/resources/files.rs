use std::path::Path;

use docchat_types::{FileRecord, FileStatus, FileUploadResponse};
use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::client::{require_id, ApiClient};
use crate::error::{ClientError, Result};

impl ApiClient {
    /// `POST /file/upload?folder_id=` as multipart field `file`
    ///
    /// Ingestion continues server-side; poll [`ApiClient::file_status`] to follow it.
    pub async fn upload_file(
        &self,
        folder_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<FileUploadResponse> {
        require_id(folder_id, "folder id")?;
        if filename.trim().is_empty() {
            return Err(ClientError::InvalidInput("file name must not be empty".to_string()));
        }

        let size = bytes.len();
        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));
        let request = self
            .request(Method::POST, "/file/upload")
            .query(&[("folder_id", folder_id)])
            .multipart(form);

        tracing::debug!("Uploading {} ({} bytes) to folder {}", filename, size, folder_id);
        self.send_json(request).await
    }

    /// Read a local file and upload it under its own name
    pub async fn upload_path(&self, folder_id: &str, path: impl AsRef<Path>) -> Result<FileUploadResponse> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::InvalidInput(format!("no file name in {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        self.upload_file(folder_id, &filename, bytes).await
    }

    /// `GET /file/{id}`
    pub async fn file_details(&self, file_id: &str) -> Result<FileRecord> {
        require_id(file_id, "file id")?;
        self.send_json(self.request(Method::GET, &format!("/file/{}", file_id)))
            .await
    }

    /// `GET /file/status/{id}`
    pub async fn file_status(&self, file_id: &str) -> Result<FileStatus> {
        require_id(file_id, "file id")?;
        self.send_json(self.request(Method::GET, &format!("/file/status/{}", file_id)))
            .await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        require_id(file_id, "file id")?;
        self.send_ack(self.request(Method::DELETE, &format!("/file/{}", file_id)))
            .await
    }
}

use docchat_types::{FileRecord, Folder, UpdateFolderData};
use reqwest::Method;

use crate::client::{require_id, ApiClient};
use crate::error::{ClientError, Result};

impl ApiClient {
    /// `GET /folder/`
    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        self.send_json(self.request(Method::GET, "/folder/")).await
    }

    pub async fn get_folder(&self, folder_id: &str) -> Result<Folder> {
        require_id(folder_id, "folder id")?;
        self.send_json(self.request(Method::GET, &format!("/folder/{}", folder_id)))
            .await
    }

    /// `POST /folder/?folder_name=`
    pub async fn create_folder(&self, name: &str) -> Result<Folder> {
        if name.trim().is_empty() {
            return Err(ClientError::InvalidInput("folder name must not be empty".to_string()));
        }
        let request = self
            .request(Method::POST, "/folder/")
            .query(&[("folder_name", name)]);
        self.send_json(request).await
    }

    pub async fn update_folder(&self, folder_id: &str, new_name: &str) -> Result<()> {
        require_id(folder_id, "folder id")?;
        let request = self
            .request(Method::PUT, &format!("/folder/{}", folder_id))
            .json(&UpdateFolderData {
                new_name: new_name.to_string(),
            });
        self.send_ack(request).await
    }

    pub async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        require_id(folder_id, "folder id")?;
        self.send_ack(self.request(Method::DELETE, &format!("/folder/{}", folder_id)))
            .await
    }

    /// `GET /folder/{id}/files`
    pub async fn folder_files(&self, folder_id: &str) -> Result<Vec<FileRecord>> {
        if folder_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.send_json(self.request(Method::GET, &format!("/folder/{}/files", folder_id)))
            .await
    }
}

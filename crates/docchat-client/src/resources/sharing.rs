use docchat_types::FolderCollaborator;
use reqwest::Method;

use crate::client::{require_id, ApiClient};
use crate::error::{ClientError, Result};

impl ApiClient {
    /// `GET /folder/{id}/collaborators`
    pub async fn folder_collaborators(&self, folder_id: &str) -> Result<Vec<FolderCollaborator>> {
        if folder_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.send_json(self.request(Method::GET, &format!("/folder/{}/collaborators", folder_id)))
            .await
    }

    /// Share a folder with another user by email
    pub async fn add_collaborator(&self, folder_id: &str, user_email: &str) -> Result<()> {
        require_id(folder_id, "folder id")?;
        require_email(user_email)?;
        let request = self
            .request(Method::POST, &format!("/folder/{}/add_user", folder_id))
            .query(&[("new_user_email", user_email)]);
        self.send_ack(request).await
    }

    pub async fn remove_collaborator(&self, folder_id: &str, user_email: &str) -> Result<()> {
        require_id(folder_id, "folder id")?;
        require_email(user_email)?;
        let request = self
            .request(Method::POST, &format!("/folder/{}/remove_user", folder_id))
            .query(&[("user_email", user_email)]);
        self.send_ack(request).await
    }
}

fn require_email(email: &str) -> Result<()> {
    if !email.contains('@') {
        return Err(ClientError::InvalidInput(format!("'{}' is not an email address", email)));
    }
    Ok(())
}

use std::future::Future;
use std::sync::Arc;

use docchat_client::{ApiClient, ClientError};
use docchat_types::{
    CreateThreadData, CreateThreadResponse, FileRecord, FileUploadResponse, Folder,
    FolderCollaborator, Thread, UpdateThreadData, UpdateThreadResponse, User, UserSearchResult,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{Mutation, QueryCache, QueryKey};
use crate::error::Result;
use crate::notice::Notifier;

/// [`ApiClient`] with reads served from a [`QueryCache`]
///
/// Every successful write applies its [`Mutation`] plan and raises a success
/// notice; a failed write raises the matching error notice. A 401 anywhere
/// empties the cache along with the session.
#[derive(Clone)]
pub struct CachedApi {
    client: ApiClient,
    cache: Arc<QueryCache>,
    notifier: Notifier,
}

impl CachedApi {
    pub fn new(client: ApiClient, cache: Arc<QueryCache>, notifier: Notifier) -> Self {
        Self { client, cache, notifier }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    async fn read<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = docchat_client::Result<T>>,
    {
        if let Some(cached) = self.cache.get_fresh(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(cached);
        }

        match fetch().await {
            Ok(value) => {
                self.cache.put(key, &value).await?;
                Ok(value)
            }
            Err(e) => Err(self.on_error(e).await),
        }
    }

    async fn complete<T>(&self, mutation: Mutation, result: docchat_client::Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.cache.apply(&mutation).await;
                if let Some(message) = mutation.success_message() {
                    self.notifier.success(message);
                }
                Ok(value)
            }
            Err(e) => {
                if !e.is_unauthorized() {
                    self.notifier.error(mutation.error_message());
                }
                Err(self.on_error(e).await)
            }
        }
    }

    async fn on_error(&self, error: ClientError) -> crate::error::SyncError {
        if error.is_unauthorized() {
            self.cache.clear().await;
        }
        error.into()
    }

    pub async fn folders(&self) -> Result<Vec<Folder>> {
        self.read(QueryKey::folders(), || self.client.list_folders())
            .await
    }

    pub async fn folder(&self, folder_id: &str) -> Result<Folder> {
        self.read(QueryKey::folder(folder_id), || self.client.get_folder(folder_id))
            .await
    }

    pub async fn folder_files(&self, folder_id: &str) -> Result<Vec<FileRecord>> {
        self.read(QueryKey::folder_files(folder_id), || {
            self.client.folder_files(folder_id)
        })
        .await
    }

    pub async fn folder_threads(&self, folder_id: &str) -> Result<Vec<Thread>> {
        self.read(QueryKey::folder_threads(folder_id), || {
            self.client.folder_threads(folder_id)
        })
        .await
    }

    pub async fn folder_collaborators(&self, folder_id: &str) -> Result<Vec<FolderCollaborator>> {
        self.read(QueryKey::folder_collaborators(folder_id), || {
            self.client.folder_collaborators(folder_id)
        })
        .await
    }

    pub async fn thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        self.read(QueryKey::thread(thread_id), || self.client.get_thread(thread_id))
            .await
    }

    pub async fn recent_threads(&self) -> Result<Vec<Thread>> {
        self.read(QueryKey::recent_threads(), || self.client.recent_threads())
            .await
    }

    pub async fn file(&self, file_id: &str) -> Result<FileRecord> {
        self.read(QueryKey::file(file_id), || self.client.file_details(file_id))
            .await
    }

    /// Signed-in user, answered from the session before asking the server
    pub async fn user(&self) -> Result<Option<User>> {
        if let Some(user) = self.client.session().current_user().await {
            return Ok(Some(user));
        }
        self.read(QueryKey::user(), || self.client.me()).await
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSearchResult>> {
        self.read(QueryKey::user_search(query), || self.client.search_users(query))
            .await
    }

    pub async fn create_folder(&self, name: &str) -> Result<Folder> {
        self.complete(Mutation::CreateFolder, self.client.create_folder(name).await)
            .await
    }

    pub async fn update_folder(&self, folder_id: &str, new_name: &str) -> Result<()> {
        let mutation = Mutation::UpdateFolder { folder_id: folder_id.to_string() };
        self.complete(mutation, self.client.update_folder(folder_id, new_name).await)
            .await
    }

    pub async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        let mutation = Mutation::DeleteFolder { folder_id: folder_id.to_string() };
        self.complete(mutation, self.client.delete_folder(folder_id).await)
            .await
    }

    pub async fn create_thread(&self, data: &CreateThreadData) -> Result<CreateThreadResponse> {
        let mutation = Mutation::CreateThread { folder_id: data.folder_id.clone() };
        self.complete(mutation, self.client.create_thread(data).await)
            .await
    }

    /// Rename a thread; the folder listing to refresh comes from the response
    pub async fn update_thread(&self, data: &UpdateThreadData) -> Result<UpdateThreadResponse> {
        let result = self.client.update_thread(data).await;
        let folder_id = result.as_ref().ok().and_then(|r| r.folder_id.clone());
        let mutation = Mutation::UpdateThread {
            thread_id: data.thread_id.clone(),
            folder_id,
        };
        self.complete(mutation, result).await
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mutation = Mutation::DeleteThread { thread_id: thread_id.to_string() };
        self.complete(mutation, self.client.delete_thread(thread_id).await)
            .await
    }

    pub async fn upload_file(
        &self,
        folder_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<FileUploadResponse> {
        let mutation = Mutation::UploadFile { folder_id: folder_id.to_string() };
        self.complete(mutation, self.client.upload_file(folder_id, filename, bytes).await)
            .await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let mutation = Mutation::DeleteFile { file_id: file_id.to_string() };
        self.complete(mutation, self.client.delete_file(file_id).await)
            .await
    }

    pub async fn add_collaborator(&self, folder_id: &str, user_email: &str) -> Result<()> {
        let mutation = Mutation::AddCollaborator { folder_id: folder_id.to_string() };
        self.complete(mutation, self.client.add_collaborator(folder_id, user_email).await)
            .await
    }

    pub async fn remove_collaborator(&self, folder_id: &str, user_email: &str) -> Result<()> {
        let mutation = Mutation::RemoveCollaborator { folder_id: folder_id.to_string() };
        self.complete(mutation, self.client.remove_collaborator(folder_id, user_email).await)
            .await
    }

    pub async fn logout(&self) -> Result<()> {
        self.complete(Mutation::Logout, self.client.logout().await)
            .await
    }
}

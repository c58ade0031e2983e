use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::Result;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Hierarchical cache key such as `["folder", "f1", "files"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Prefix match on whole segments
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn folders() -> Self {
        Self::new(["folders"])
    }

    pub fn folder(folder_id: &str) -> Self {
        Self::new(["folder", folder_id])
    }

    pub fn folder_files(folder_id: &str) -> Self {
        Self::new(["folder", folder_id, "files"])
    }

    pub fn folder_threads(folder_id: &str) -> Self {
        Self::new(["folder", folder_id, "threads"])
    }

    pub fn folder_collaborators(folder_id: &str) -> Self {
        Self::new(["folder", folder_id, "collaborators"])
    }

    pub fn thread(thread_id: &str) -> Self {
        Self::new(["thread", thread_id])
    }

    pub fn recent_threads() -> Self {
        Self::new(["recent-threads"])
    }

    pub fn file(file_id: &str) -> Self {
        Self::new(["file", file_id])
    }

    pub fn user() -> Self {
        Self::new(["user"])
    }

    pub fn user_search(query: &str) -> Self {
        Self::new(["users", "search", query])
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

struct CacheEntry {
    value: Value,
    fetched_at: Instant,
    stale: bool,
}

/// In-memory cache of server reads keyed by [`QueryKey`]
///
/// Values are stored as JSON so one cache holds every resource type.
/// Invalidation marks entries stale; the next read refetches them.
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    stale_time: Duration,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_time,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Cached value if present, not invalidated and younger than the stale time
    pub async fn get_fresh<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stale || entry.fetched_at.elapsed() >= self.stale_time {
            return None;
        }
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Cached value under {} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Cached value regardless of freshness
    pub async fn peek(&self, key: &QueryKey) -> Option<Value> {
        self.entries.read().await.get(key).map(|e| e.value.clone())
    }

    pub async fn put<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.entries.write().await.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                stale: false,
            },
        );
        Ok(())
    }

    /// Mark every entry under `prefix` stale; returns how many were marked
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                count += 1;
            }
        }
        tracing::debug!("Invalidated {} entries under {}", count, prefix);
        count
    }

    /// Drop every entry under `prefix`; returns how many were removed
    pub async fn remove(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.entries.read().await.get(key).map(|e| e.stale)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Apply the invalidation plan of a successful write
    pub async fn apply(&self, mutation: &Mutation) {
        let plan = mutation.plan();
        if plan.clear {
            self.clear().await;
            return;
        }
        for key in &plan.remove {
            self.remove(key).await;
        }
        for key in &plan.invalidate {
            self.invalidate(key).await;
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

/// A successful write against the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateFolder,
    UpdateFolder { folder_id: String },
    DeleteFolder { folder_id: String },
    CreateThread { folder_id: String },
    UpdateThread { thread_id: String, folder_id: Option<String> },
    DeleteThread { thread_id: String },
    UploadFile { folder_id: String },
    DeleteFile { file_id: String },
    AddCollaborator { folder_id: String },
    RemoveCollaborator { folder_id: String },
    Logout,
}

/// Which cached reads a mutation affects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub invalidate: Vec<QueryKey>,
    pub remove: Vec<QueryKey>,
    pub clear: bool,
}

impl Mutation {
    pub fn plan(&self) -> InvalidationPlan {
        let mut plan = InvalidationPlan::default();
        match self {
            Mutation::CreateFolder => {
                plan.invalidate = vec![QueryKey::folders()];
            }
            Mutation::UpdateFolder { folder_id } => {
                plan.invalidate = vec![QueryKey::folder(folder_id), QueryKey::folders()];
            }
            Mutation::DeleteFolder { folder_id } => {
                plan.invalidate = vec![QueryKey::folders(), QueryKey::recent_threads()];
                plan.remove = vec![QueryKey::folder(folder_id)];
            }
            Mutation::CreateThread { folder_id } => {
                plan.invalidate = vec![
                    QueryKey::folder(folder_id),
                    QueryKey::folder_threads(folder_id),
                    QueryKey::folders(),
                    QueryKey::recent_threads(),
                ];
            }
            Mutation::UpdateThread { thread_id, folder_id } => {
                plan.invalidate.push(QueryKey::thread(thread_id));
                if let Some(folder_id) = folder_id {
                    plan.invalidate.push(QueryKey::folder_threads(folder_id));
                }
                plan.invalidate.push(QueryKey::folders());
                plan.invalidate.push(QueryKey::recent_threads());
            }
            Mutation::DeleteThread { thread_id } => {
                plan.invalidate = vec![QueryKey::folders(), QueryKey::recent_threads()];
                plan.remove = vec![QueryKey::thread(thread_id)];
            }
            Mutation::UploadFile { folder_id } => {
                plan.invalidate = vec![
                    QueryKey::folder(folder_id),
                    QueryKey::folder_files(folder_id),
                    QueryKey::folders(),
                ];
            }
            Mutation::DeleteFile { file_id } => {
                plan.invalidate = vec![QueryKey::folders()];
                plan.remove = vec![QueryKey::file(file_id)];
            }
            Mutation::AddCollaborator { folder_id } | Mutation::RemoveCollaborator { folder_id } => {
                plan.invalidate = vec![
                    QueryKey::folder_collaborators(folder_id),
                    QueryKey::folder(folder_id),
                ];
            }
            Mutation::Logout => {
                plan.clear = true;
            }
        }
        plan
    }

    pub fn success_message(&self) -> Option<&'static str> {
        match self {
            Mutation::CreateFolder => Some("Folder created successfully"),
            Mutation::UpdateFolder { .. } => Some("Folder updated successfully"),
            Mutation::DeleteFolder { .. } => Some("Folder deleted successfully"),
            Mutation::CreateThread { .. } => Some("Thread created successfully"),
            Mutation::UpdateThread { .. } => Some("Thread updated successfully"),
            Mutation::DeleteThread { .. } => Some("Thread deleted successfully"),
            Mutation::UploadFile { .. } => Some("File uploaded successfully"),
            Mutation::DeleteFile { .. } => Some("File deleted successfully"),
            Mutation::AddCollaborator { .. } => Some("Collaborator added successfully"),
            Mutation::RemoveCollaborator { .. } => Some("Collaborator removed successfully"),
            Mutation::Logout => None,
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Mutation::CreateFolder => "Failed to create folder",
            Mutation::UpdateFolder { .. } => "Failed to update folder",
            Mutation::DeleteFolder { .. } => "Failed to delete folder",
            Mutation::CreateThread { .. } => "Failed to create thread",
            Mutation::UpdateThread { .. } => "Failed to update thread",
            Mutation::DeleteThread { .. } => "Failed to delete thread",
            Mutation::UploadFile { .. } => "Failed to upload file",
            Mutation::DeleteFile { .. } => "Failed to delete file",
            Mutation::AddCollaborator { .. } => "Failed to add collaborator",
            Mutation::RemoveCollaborator { .. } => "Failed to remove collaborator",
            Mutation::Logout => "Failed to log out",
        }
    }
}

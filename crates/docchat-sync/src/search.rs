use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docchat_client::resources::MIN_SEARCH_QUERY_LEN;
use docchat_client::ApiClient;
use docchat_types::UserSearchResult;

use crate::cached_api::CachedApi;
use crate::error::Result;

/// Source of user search results
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<UserSearchResult>>;
}

#[async_trait]
impl UserDirectory for ApiClient {
    async fn search(&self, query: &str) -> Result<Vec<UserSearchResult>> {
        Ok(self.search_users(query).await?)
    }
}

#[async_trait]
impl UserDirectory for CachedApi {
    async fn search(&self, query: &str) -> Result<Vec<UserSearchResult>> {
        self.search_users(query).await
    }
}

/// Debounced user lookup for the share dialog
///
/// Each call to [`UserSearch::query`] supersedes the previous one. A call that
/// is superseded during its quiet period never reaches the server and yields
/// `None`.
pub struct UserSearch {
    directory: Arc<dyn UserDirectory>,
    debounce: Duration,
    generation: AtomicU64,
    excluded: HashSet<String>,
}

impl UserSearch {
    pub fn new(directory: Arc<dyn UserDirectory>, debounce: Duration) -> Self {
        Self {
            directory,
            debounce,
            generation: AtomicU64::new(0),
            excluded: HashSet::new(),
        }
    }

    /// Hide these users from results, typically the current collaborators
    pub fn exclude<I, S>(mut self, user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(user_ids.into_iter().map(Into::into));
        self
    }

    pub async fn query(&self, text: &str) -> Result<Option<Vec<UserSearchResult>>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let text = text.trim();
        if text.chars().count() < MIN_SEARCH_QUERY_LEN {
            return Ok(Some(Vec::new()));
        }

        tokio::time::sleep(self.debounce).await;
        if self.is_superseded(generation) {
            return Ok(None);
        }

        let results = self.directory.search(text).await?;
        if self.is_superseded(generation) {
            tracing::debug!("Dropping stale search results for {:?}", text);
            return Ok(None);
        }

        Ok(Some(
            results
                .into_iter()
                .filter(|user| !self.excluded.contains(&user.id))
                .collect(),
        ))
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingDirectory {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UserDirectory for RecordingDirectory {
        async fn search(&self, query: &str) -> Result<Vec<UserSearchResult>> {
            self.queries.lock().push(query.to_string());
            Ok(vec![
                UserSearchResult {
                    id: "u1".to_string(),
                    name: Some("Ada".to_string()),
                    email: "ada@example.com".to_string(),
                },
                UserSearchResult {
                    id: "u2".to_string(),
                    name: None,
                    email: "adam@example.com".to_string(),
                },
            ])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_query_reaches_directory() {
        let directory = Arc::new(RecordingDirectory::default());
        let search = UserSearch::new(directory.clone(), Duration::from_millis(300));

        let (first, second) = tokio::join!(search.query("ad"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            search.query("ada").await
        });

        assert_eq!(first.unwrap(), None);
        assert_eq!(second.unwrap().map(|r| r.len()), Some(2));
        assert_eq!(*directory.queries.lock(), vec!["ada".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_waits_out_quiet_period() {
        let directory = Arc::new(RecordingDirectory::default());
        let search = UserSearch::new(directory.clone(), Duration::from_millis(300));

        let mut pending = tokio_test::task::spawn(search.query("ada"));
        tokio_test::assert_pending!(pending.poll());

        tokio::time::advance(Duration::from_millis(299)).await;
        tokio_test::assert_pending!(pending.poll());
        assert!(directory.queries.lock().is_empty());

        tokio::time::advance(Duration::from_millis(1)).await;
        let results = tokio_test::assert_ready_ok!(pending.poll());
        assert_eq!(results.map(|r| r.len()), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_is_answered_locally() {
        let directory = Arc::new(RecordingDirectory::default());
        let search = UserSearch::new(directory.clone(), Duration::from_millis(300));

        assert_eq!(search.query("a").await.unwrap(), Some(Vec::new()));
        assert!(directory.queries.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_excluded_users_filtered() {
        let directory = Arc::new(RecordingDirectory::default());
        let search = UserSearch::new(directory, Duration::from_millis(300)).exclude(["u1"]);

        let results = search.query("ada").await.unwrap().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "u2");
    }
}

use std::sync::Arc;

use docchat_client::{ApiClient, ChatApi, Session, SessionEvent};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::builder::AppContextBuilder;
use crate::cache::QueryCache;
use crate::cached_api::CachedApi;
use crate::chat::ChatSession;
use crate::notice::Notifier;
use crate::poller::ThreadPoller;
use crate::search::UserSearch;
use crate::settings::SyncSettings;

/// Folder tree and dialog flags of the navigation sidebar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidebarState {
    pub expanded_folder: Option<String>,
    pub new_folder_dialog_open: bool,
    pub new_chat_dialog_open: bool,
    pub search_open: bool,
}

impl SidebarState {
    /// Expand `folder_id`, or collapse it when it is already expanded
    pub fn toggle_folder(&mut self, folder_id: &str) {
        if self.expanded_folder.as_deref() == Some(folder_id) {
            self.expanded_folder = None;
        } else {
            self.expanded_folder = Some(folder_id.to_string());
        }
    }
}

/// Which uploaded file is being inspected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    pub selected_file_id: Option<String>,
    pub is_file_view_open: bool,
}

impl FileSelection {
    pub fn select(&mut self, file_id: Option<String>) {
        self.selected_file_id = file_id;
    }

    pub fn open_file_view(&mut self, file_id: impl Into<String>) {
        self.selected_file_id = Some(file_id.into());
        self.is_file_view_open = true;
    }

    pub fn close_file_view(&mut self) {
        self.selected_file_id = None;
        self.is_file_view_open = false;
    }
}

/// Application state created once at start-up and passed by reference
///
/// Owns the identity session, the query cache, UI selection state and the
/// notice channel. When the session ends (logout or a 401) the cache and UI
/// state are reset by the watcher from [`AppContext::watch_session`].
pub struct AppContext {
    api: CachedApi,
    notifier: Notifier,
    settings: SyncSettings,
    sidebar: RwLock<SidebarState>,
    selection: RwLock<FileSelection>,
}

impl AppContext {
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }

    pub(crate) fn new(client: ApiClient, settings: SyncSettings, notifier: Notifier) -> Self {
        let cache = Arc::new(QueryCache::new(settings.stale_time()));
        Self {
            api: CachedApi::new(client, cache, notifier.clone()),
            notifier,
            settings,
            sidebar: RwLock::new(SidebarState::default()),
            selection: RwLock::new(FileSelection::default()),
        }
    }

    pub fn api(&self) -> &CachedApi {
        &self.api
    }

    pub fn client(&self) -> &ApiClient {
        self.api.client()
    }

    pub fn session(&self) -> &Arc<Session> {
        self.api.client().session()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        self.api.cache()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn sidebar(&self) -> &RwLock<SidebarState> {
        &self.sidebar
    }

    pub fn selection(&self) -> &RwLock<FileSelection> {
        &self.selection
    }

    /// Chat driver sharing this context's cache and notices
    pub fn chat_session(&self) -> ChatSession {
        let api: Arc<dyn ChatApi> = Arc::new(self.client().clone());
        ChatSession::new(
            api,
            Arc::clone(self.cache()),
            self.notifier.clone(),
            self.settings.settle_window(),
        )
    }

    /// Poll the active thread of `chat` at the configured interval
    pub fn poll_thread(&self, chat: &ChatSession) -> ThreadPoller {
        let api: Arc<dyn ChatApi> = Arc::new(self.client().clone());
        ThreadPoller::spawn(
            api,
            Arc::clone(chat.sync()),
            Arc::clone(chat.revisions()),
            self.settings.poll_interval(),
        )
    }

    pub fn user_search(&self) -> UserSearch {
        UserSearch::new(Arc::new(self.api.clone()), self.settings.search_debounce())
    }

    /// Forget everything tied to the signed-in user
    pub async fn reset(&self) {
        self.cache().clear().await;
        *self.sidebar.write().await = SidebarState::default();
        *self.selection.write().await = FileSelection::default();
    }

    /// Reset state whenever the session ends
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let context = Arc::clone(self);
        let mut events = self.session().subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SignedOut) => context.reset().await,
                    Ok(SessionEvent::LoginRequired { redirect_to }) => {
                        tracing::info!("Login required, redirecting to {}", redirect_to);
                        context.reset().await;
                    }
                    Ok(SessionEvent::SignedIn(user)) => {
                        tracing::debug!("Signed in as {}", user.email);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Session watcher lagged by {} events", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_folder() {
        let mut sidebar = SidebarState::default();

        sidebar.toggle_folder("f1");
        assert_eq!(sidebar.expanded_folder.as_deref(), Some("f1"));

        sidebar.toggle_folder("f2");
        assert_eq!(sidebar.expanded_folder.as_deref(), Some("f2"));

        sidebar.toggle_folder("f2");
        assert_eq!(sidebar.expanded_folder, None);
    }

    #[test]
    fn test_file_view_lifecycle() {
        let mut selection = FileSelection::default();

        selection.open_file_view("x1");
        assert_eq!(selection.selected_file_id.as_deref(), Some("x1"));
        assert!(selection.is_file_view_open);

        selection.close_file_view();
        assert_eq!(selection, FileSelection::default());
    }

    #[tokio::test]
    async fn test_session_end_resets_state() {
        let context = Arc::new(AppContext::builder().build().unwrap());
        let watcher = context.watch_session();

        context
            .cache()
            .put(crate::cache::QueryKey::folders(), &Vec::<String>::new())
            .await
            .unwrap();
        context.sidebar().write().await.toggle_folder("f1");
        context.selection().write().await.open_file_view("x1");

        context.session().invalidate().await;
        for _ in 0..50 {
            if !context.selection().read().await.is_file_view_open {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(context.cache().is_empty().await);
        assert_eq!(*context.sidebar().read().await, SidebarState::default());
        assert!(!context.selection().read().await.is_file_view_open);
        watcher.abort();
    }
}

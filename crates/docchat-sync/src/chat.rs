use std::sync::Arc;
use std::time::Duration;

use docchat_client::{ChatApi, ChatStreamDriver, ChatStreamHandler, StreamSummary};
use docchat_types::{Citation, Message, Thread};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::cache::{QueryCache, QueryKey};
use crate::error::{Result, SyncError};
use crate::notice::Notifier;
use crate::reconciler::{SyncPhase, ThreadSync};

pub const SEND_FAILED_NOTICE: &str = "Failed to send message";

/// Routes decoded chat events of one send into the shared [`ThreadSync`]
///
/// Events only land while the send's own session is streaming. Once the
/// thread is switched or another send has started, the handler goes inert.
pub struct ThreadSyncHandler {
    sync: Arc<Mutex<ThreadSync>>,
    ai_message_id: String,
    notifier: Notifier,
    revisions: Arc<watch::Sender<u64>>,
}

impl ThreadSyncHandler {
    pub fn new(
        sync: Arc<Mutex<ThreadSync>>,
        ai_message_id: impl Into<String>,
        notifier: Notifier,
        revisions: Arc<watch::Sender<u64>>,
    ) -> Self {
        Self {
            sync,
            ai_message_id: ai_message_id.into(),
            notifier,
            revisions,
        }
    }
}

impl ChatStreamHandler for ThreadSyncHandler {
    fn on_content(&mut self, delta: &str) {
        let mut sync = self.sync.lock();
        match sync.append_content(&self.ai_message_id, delta) {
            Ok(()) => {
                self.revisions.send_replace(sync.revision());
            }
            Err(e) => tracing::debug!("Discarding content delta: {}", e),
        }
    }

    fn on_citations(&mut self, citations: Vec<Citation>) {
        let mut sync = self.sync.lock();
        match sync.set_citations(&self.ai_message_id, citations) {
            Ok(()) => {
                self.revisions.send_replace(sync.revision());
            }
            Err(e) => tracing::debug!("Discarding citations: {}", e),
        }
    }

    fn on_server_error(&mut self, message: &str) {
        if self.sync.lock().is_streaming_for(&self.ai_message_id) {
            self.notifier.error(message);
        } else {
            tracing::debug!("Discarding server error of a detached stream: {}", message);
        }
    }
}

/// Drives chat turns on one thread
///
/// A send inserts optimistic messages, streams the answer into them, then
/// waits out the settle window before the refetched server history is
/// reconciled. Network and protocol failures leave the optimistic messages in
/// place and raise a notice; nothing is retried.
#[derive(Clone)]
pub struct ChatSession {
    api: Arc<dyn ChatApi>,
    sync: Arc<Mutex<ThreadSync>>,
    cache: Arc<QueryCache>,
    notifier: Notifier,
    settle_window: Duration,
    revisions: Arc<watch::Sender<u64>>,
}

impl ChatSession {
    pub fn new(
        api: Arc<dyn ChatApi>,
        cache: Arc<QueryCache>,
        notifier: Notifier,
        settle_window: Duration,
    ) -> Self {
        Self {
            api,
            sync: Arc::new(Mutex::new(ThreadSync::new())),
            cache,
            notifier,
            settle_window,
            revisions: Arc::new(watch::channel(0).0),
        }
    }

    /// Revision of the local message list, bumped whenever it changes
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revisions.subscribe()
    }

    /// Shared reconciler state, for pollers and renderers
    pub fn sync(&self) -> &Arc<Mutex<ThreadSync>> {
        &self.sync
    }

    /// Sender behind [`ChatSession::watch`], for background refetches
    pub fn revisions(&self) -> &Arc<watch::Sender<u64>> {
        &self.revisions
    }

    pub fn messages(&self) -> Vec<Message> {
        self.sync.lock().messages().to_vec()
    }

    pub fn is_streaming(&self) -> bool {
        self.sync.lock().is_streaming()
    }

    pub fn phase(&self) -> SyncPhase {
        self.sync.lock().phase()
    }

    /// Load a thread and make it the active one
    ///
    /// `Ok(None)` means the thread does not exist; the previous thread stays active.
    pub async fn open_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let thread = self.api.fetch_thread(thread_id).await?;
        match &thread {
            Some(thread) => {
                self.cache.put(QueryKey::thread(thread_id), &Some(thread)).await?;
                self.sync
                    .lock()
                    .switch_thread(thread_id, thread.messages.clone());
                self.publish();
            }
            None => tracing::info!("Thread {} not found", thread_id),
        }
        Ok(thread)
    }

    /// Refetch the active thread; returns whether the local list changed
    pub async fn refresh(&self) -> Result<bool> {
        let thread_id = self.active_thread()?;
        match self.api.fetch_thread(&thread_id).await? {
            Some(thread) => {
                let changed = self.sync.lock().observe_server(&thread_id, thread.messages);
                if changed {
                    self.publish();
                }
                Ok(changed)
            }
            None => Ok(false),
        }
    }

    /// Send one message and stream the answer into the active thread
    pub async fn send(&self, text: &str) -> Result<StreamSummary> {
        let (thread_id, ai_message_id) = {
            let mut sync = self.sync.lock();
            let session = sync.begin_send(text)?;
            (session.thread_id.clone(), session.ai_message_id.clone())
        };
        self.publish();

        let outcome = self.stream_answer(&thread_id, &ai_message_id, text).await;

        if let Err(e) = self.sync.lock().end_stream(&ai_message_id) {
            tracing::debug!("Stream on {} ended after a thread switch: {}", thread_id, e);
        }
        self.cache.invalidate(&QueryKey::thread(&thread_id)).await;

        let unauthorized = matches!(&outcome, Err(e) if e.is_unauthorized());
        if let Err(e) = &outcome {
            if !unauthorized {
                tracing::error!("Chat turn on thread {} failed: {}", thread_id, e);
                self.notifier.error(SEND_FAILED_NOTICE);
            }
        }

        if !unauthorized {
            tokio::time::sleep(self.settle_window).await;
            self.refetch(&thread_id).await;
        }
        if self.sync.lock().settle(&ai_message_id) {
            self.publish();
        }

        outcome
    }

    async fn stream_answer(
        &self,
        thread_id: &str,
        ai_message_id: &str,
        text: &str,
    ) -> Result<StreamSummary> {
        let stream = self.api.chat_stream(thread_id, text).await?;
        let handler = ThreadSyncHandler::new(
            Arc::clone(&self.sync),
            ai_message_id,
            self.notifier.clone(),
            Arc::clone(&self.revisions),
        );
        let mut driver = ChatStreamDriver::new(handler);
        Ok(driver.run(stream).await?)
    }

    /// Server history after a send; parked by the reconciler until it settles
    async fn refetch(&self, thread_id: &str) {
        match self.api.fetch_thread(thread_id).await {
            Ok(Some(thread)) => {
                if let Err(e) = self.cache.put(QueryKey::thread(thread_id), &Some(&thread)).await {
                    tracing::warn!("Could not cache thread {}: {}", thread_id, e);
                }
                self.sync.lock().observe_server(thread_id, thread.messages);
            }
            Ok(None) => tracing::debug!("Thread {} gone before refetch", thread_id),
            Err(e) => tracing::warn!("Refetch of thread {} failed: {}", thread_id, e),
        }
    }

    fn publish(&self) {
        let revision = self.sync.lock().revision();
        self.revisions.send_replace(revision);
    }

    fn active_thread(&self) -> Result<String> {
        self.sync
            .lock()
            .thread_id()
            .map(str::to_string)
            .ok_or(SyncError::NoThread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use docchat_client::{ClientError, EventStream, StatusCode};
    use docchat_types::{Role, StreamEvent};

    #[derive(Default)]
    struct FakeApi {
        events: Mutex<Vec<docchat_client::Result<StreamEvent>>>,
        chat_error: Mutex<Option<ClientError>>,
        history: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl ChatApi for FakeApi {
        async fn chat_stream(&self, _thread_id: &str, _message: &str) -> docchat_client::Result<EventStream> {
            if let Some(e) = self.chat_error.lock().take() {
                return Err(e);
            }
            let events = std::mem::take(&mut *self.events.lock());
            Ok(Box::pin(futures::stream::iter(events)))
        }

        async fn fetch_thread(&self, thread_id: &str) -> docchat_client::Result<Option<Thread>> {
            Ok(Some(Thread {
                id: thread_id.to_string(),
                name: "Questions".to_string(),
                folder_id: Some("f1".to_string()),
                messages: self.history.lock().clone(),
                created_at: None,
                updated_at: None,
                folder_name: None,
            }))
        }
    }

    fn session_with(api: Arc<FakeApi>) -> (ChatSession, Notifier) {
        let notifier = Notifier::default();
        let session = ChatSession::new(
            api,
            Arc::new(QueryCache::default()),
            notifier.clone(),
            Duration::from_millis(500),
        );
        (session, notifier)
    }

    fn confirmed(content: &str) -> Vec<Message> {
        let now = Utc::now() + ChronoDuration::seconds(1);
        let mut user = Message::user("m1", "Hello");
        user.created_at = now;
        let mut answer = Message::ai_placeholder("m2");
        answer.content = content.to_string();
        answer.created_at = now + ChronoDuration::milliseconds(10);
        vec![user, answer]
    }

    fn text(content: &str) -> docchat_client::Result<StreamEvent> {
        Ok(StreamEvent::Message { content: content.to_string() })
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_reconciles_after_settle() {
        let api = Arc::new(FakeApi::default());
        let (session, _) = session_with(api.clone());
        session.open_thread("T").await.unwrap();

        *api.events.lock() = vec![
            text("Hi"),
            text(" there"),
            Ok(StreamEvent::Citation { citations: vec![Citation::new("f1", "Doc", 3)] }),
            Ok(StreamEvent::Done),
        ];
        *api.history.lock() = confirmed("Hi there");

        let summary = session.send("Hello").await.unwrap();

        assert!(summary.saw_done);
        assert!(!session.is_streaming());
        assert_eq!(session.phase(), SyncPhase::Idle);
        let messages = session.messages();
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(messages[1].content, "Hi there");
        assert!(session.sync().lock().pending_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_send_keeps_optimistic_messages() {
        let api = Arc::new(FakeApi::default());
        let (session, notifier) = session_with(api.clone());
        let mut notices = notifier.subscribe();
        session.open_thread("T").await.unwrap();

        *api.chat_error.lock() = Some(ClientError::Protocol {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        });

        let err = session.send("Hello").await.unwrap_err();

        assert!(matches!(err, SyncError::Client(ClientError::Protocol { .. })));
        assert_eq!(notices.recv().await.unwrap().text, SEND_FAILED_NOTICE);
        let roles: Vec<_> = session.messages().iter().map(|m| (m.role, m.content.clone())).collect();
        assert_eq!(roles, vec![(Role::User, "Hello".to_string()), (Role::Ai, String::new())]);
        assert_eq!(session.phase(), SyncPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_event_is_a_notice() {
        let api = Arc::new(FakeApi::default());
        let (session, notifier) = session_with(api.clone());
        let mut notices = notifier.subscribe();
        session.open_thread("T").await.unwrap();

        *api.events.lock() = vec![
            Ok(StreamEvent::Error { message: "retrieval degraded".to_string() }),
            text("still answering"),
        ];

        session.send("Hello").await.unwrap();

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.text, "retrieval degraded");
        assert_eq!(session.messages()[1].content, "still answering");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_send_escalates_without_notice() {
        let api = Arc::new(FakeApi::default());
        let (session, notifier) = session_with(api.clone());
        let mut notices = notifier.subscribe();
        session.open_thread("T").await.unwrap();

        *api.chat_error.lock() = Some(ClientError::Unauthorized);

        let err = session.send("Hello").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchers_see_streamed_content() {
        let api = Arc::new(FakeApi::default());
        let (session, _) = session_with(api.clone());
        let mut updates = session.watch();
        session.open_thread("T").await.unwrap();
        assert!(updates.has_changed().unwrap());
        updates.borrow_and_update();

        *api.events.lock() = vec![text("Hi"), Ok(StreamEvent::Done)];
        *api.history.lock() = confirmed("Hi");

        let before = *updates.borrow();
        session.send("Hello").await.unwrap();

        assert!(updates.has_changed().unwrap());
        assert!(*updates.borrow_and_update() > before);
        assert_eq!(*updates.borrow(), session.sync().lock().revision());
    }

    #[test]
    fn test_handler_of_abandoned_send_goes_inert() {
        let sync = Arc::new(Mutex::new(ThreadSync::new()));
        let notifier = Notifier::default();
        let mut notices = notifier.subscribe();
        let revisions = Arc::new(watch::channel(0).0);

        sync.lock().switch_thread("T1", Vec::new());
        let old_id = sync.lock().begin_send("first").unwrap().ai_message_id.clone();
        let mut old = ThreadSyncHandler::new(sync.clone(), old_id.clone(), notifier.clone(), revisions.clone());

        sync.lock().switch_thread("T2", Vec::new());
        let new_id = sync.lock().begin_send("second").unwrap().ai_message_id.clone();
        let mut current = ThreadSyncHandler::new(sync.clone(), new_id, notifier, revisions);
        current.on_content("T2 answer");

        old.on_content(" leaked from T1");
        old.on_citations(vec![Citation::new("f1", "Doc", 3)]);
        old.on_server_error("T1 failed");
        assert!(sync.lock().end_stream(&old_id).is_err());

        current.on_content(" continues");
        let guard = sync.lock();
        assert!(guard.is_streaming());
        assert_eq!(guard.messages()[1].content, "T2 answer continues");
        assert!(guard.messages()[1].citations().is_empty());
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_without_thread() {
        let (session, _) = session_with(Arc::new(FakeApi::default()));
        assert!(matches!(session.send("Hello").await, Err(SyncError::NoThread)));
        assert!(matches!(session.refresh().await, Err(SyncError::NoThread)));
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use docchat_client::ChatApi;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::reconciler::ThreadSync;

/// Background refetch of the active thread at a fixed interval
///
/// Snapshots go through [`ThreadSync::observe_server`], so a poll landing
/// mid-stream is parked instead of overwriting streamed text. Applied snapshots
/// bump `revisions` so watchers redraw. Polling stops on its own after a 401.
pub struct ThreadPoller {
    enabled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ThreadPoller {
    pub fn spawn(
        api: Arc<dyn ChatApi>,
        sync: Arc<Mutex<ThreadSync>>,
        revisions: Arc<watch::Sender<u64>>,
        interval: Duration,
    ) -> Self {
        let enabled = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&enabled);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !flag.load(Ordering::Relaxed) {
                    continue;
                }

                let Some(thread_id) = sync.lock().thread_id().map(str::to_string) else {
                    continue;
                };

                match api.fetch_thread(&thread_id).await {
                    Ok(Some(thread)) => {
                        let mut guard = sync.lock();
                        if guard.observe_server(&thread_id, thread.messages) {
                            revisions.send_replace(guard.revision());
                            tracing::debug!("Poll updated thread {}", thread_id);
                        }
                    }
                    Ok(None) => tracing::debug!("Polled thread {} no longer exists", thread_id),
                    Err(e) if e.is_unauthorized() => {
                        tracing::info!("Stopping thread poller: session ended");
                        break;
                    }
                    Err(e) => tracing::warn!("Thread poll failed: {}", e),
                }
            }
        });

        Self { enabled, handle }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ThreadPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docchat_client::{ClientError, EventStream};
    use docchat_types::{Message, Thread};
    use std::sync::atomic::AtomicUsize;

    struct CountingApi {
        fetches: AtomicUsize,
        unauthorized: bool,
    }

    #[async_trait]
    impl ChatApi for CountingApi {
        async fn chat_stream(&self, _thread_id: &str, _message: &str) -> docchat_client::Result<EventStream> {
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn fetch_thread(&self, thread_id: &str) -> docchat_client::Result<Option<Thread>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.unauthorized {
                return Err(ClientError::Unauthorized);
            }
            Ok(Some(Thread {
                id: thread_id.to_string(),
                name: "Questions".to_string(),
                folder_id: None,
                messages: vec![Message::user("m1", "polled")],
                created_at: None,
                updated_at: None,
                folder_name: None,
            }))
        }
    }

    fn revisions() -> Arc<watch::Sender<u64>> {
        Arc::new(watch::channel(0).0)
    }

    fn api(unauthorized: bool) -> Arc<CountingApi> {
        Arc::new(CountingApi {
            fetches: AtomicUsize::new(0),
            unauthorized,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_reconciles_active_thread() {
        let api = api(false);
        let sync = Arc::new(Mutex::new(ThreadSync::new()));
        sync.lock().switch_thread("T", Vec::new());

        let revisions = revisions();
        let mut watcher = revisions.subscribe();

        let poller = ThreadPoller::spawn(
            api.clone(),
            Arc::clone(&sync),
            Arc::clone(&revisions),
            Duration::from_secs(30),
        );

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 0);
        assert!(!watcher.has_changed().unwrap());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(sync.lock().messages()[0].content, "polled");
        assert!(watcher.has_changed().unwrap());
        assert_eq!(*watcher.borrow_and_update(), sync.lock().revision());

        // Same snapshot again changes nothing
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
        assert!(!watcher.has_changed().unwrap());

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_poller_skips_fetch() {
        let api = api(false);
        let sync = Arc::new(Mutex::new(ThreadSync::new()));
        sync.lock().switch_thread("T", Vec::new());

        let poller = ThreadPoller::spawn(api.clone(), sync, revisions(), Duration::from_secs(30));
        poller.set_enabled(false);

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stops_after_unauthorized() {
        let api = api(true);
        let sync = Arc::new(Mutex::new(ThreadSync::new()));
        sync.lock().switch_thread("T", Vec::new());

        let poller = ThreadPoller::spawn(api.clone(), sync, revisions(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
        assert!(!poller.is_running());
    }
}

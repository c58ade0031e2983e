use async_trait::async_trait;
use docchat_types::Thread;

use crate::error::Result;
use crate::streaming::EventStream;

/// The two calls a chat session needs from the transport
///
/// [`ApiClient`](crate::ApiClient) is the production implementation; tests and
/// alternative transports can supply their own.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Start a chat turn and stream its decoded events
    async fn chat_stream(&self, thread_id: &str, message: &str) -> Result<EventStream>;

    /// Fetch the authoritative thread history; `None` when the thread is gone
    async fn fetch_thread(&self, thread_id: &str) -> Result<Option<Thread>>;
}

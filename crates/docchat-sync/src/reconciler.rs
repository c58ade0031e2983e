use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use chrono::Utc;
use docchat_client::ClientError;
use docchat_types::message::sort_by_created_at;
use docchat_types::{Citation, Message};

use crate::error::{Result, SyncError};

pub const USER_ID_PREFIX: &str = "temp-user-";
pub const AI_ID_PREFIX: &str = "temp-ai-";

/// Where a thread is relative to its in-flight send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPhase {
    /// Server snapshots are reconciled as they arrive
    #[default]
    Idle,
    /// A stream is active; server snapshots are parked
    Optimistic,
    /// The stream ended and the server write has not settled yet
    Reconciling,
}

/// Ephemeral state of one send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSession {
    pub thread_id: String,
    pub user_message_id: String,
    pub ai_message_id: String,
    pub content: String,
    pub is_streaming: bool,
}

/// Whether an id was minted locally for an optimistic message
pub fn is_synthetic_id(id: &str) -> bool {
    id.starts_with(USER_ID_PREFIX) || id.starts_with(AI_ID_PREFIX)
}

/// Content hash of an already sorted message list
pub fn fingerprint(messages: &[Message]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for message in messages {
        message.id.hash(&mut hasher);
        message.content.hash(&mut hasher);
    }
    messages.len().hash(&mut hasher);
    hasher.finish()
}

/// Local message list of one thread, merged from server history and
/// optimistic inserts
///
/// Server snapshots only replace local state in [`SyncPhase::Idle`]. While a
/// stream is active (or settling) the newest snapshot is parked and applied by
/// [`ThreadSync::settle`], so streamed text never reverts to a stale fetch.
#[derive(Debug, Default)]
pub struct ThreadSync {
    thread_id: Option<String>,
    messages: Vec<Message>,
    pending: HashSet<String>,
    fingerprint: Option<u64>,
    phase: SyncPhase,
    session: Option<StreamSession>,
    parked: Option<Vec<Message>>,
    revision: u64,
}

impl ThreadSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&StreamSession> {
        self.session.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_streaming)
    }

    /// Whether `ai_id` names the session that is still streaming
    pub fn is_streaming_for(&self, ai_id: &str) -> bool {
        self.require_streaming(ai_id).is_ok()
    }

    pub fn pending_ids(&self) -> &HashSet<String> {
        &self.pending
    }

    /// Bumped on every visible change of the message list
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drop all local state and seed from a fresh server history
    pub fn switch_thread(&mut self, thread_id: impl Into<String>, mut server: Vec<Message>) {
        let thread_id = thread_id.into();
        sort_by_created_at(&mut server);
        tracing::debug!("Switching to thread {} with {} messages", thread_id, server.len());

        self.fingerprint = Some(fingerprint(&server));
        self.messages = server;
        self.thread_id = Some(thread_id);
        self.pending.clear();
        self.phase = SyncPhase::Idle;
        self.session = None;
        self.parked = None;
        self.revision += 1;
    }

    /// Offer a server snapshot of `thread_id`
    ///
    /// Returns `true` when the local list changed. Snapshots for another thread
    /// are stale fetches and are ignored.
    pub fn observe_server(&mut self, thread_id: &str, messages: Vec<Message>) -> bool {
        if self.thread_id.as_deref() != Some(thread_id) {
            tracing::debug!("Ignoring snapshot of inactive thread {}", thread_id);
            return false;
        }

        match self.phase {
            SyncPhase::Idle => self.reconcile(messages),
            SyncPhase::Optimistic | SyncPhase::Reconciling => {
                tracing::debug!("Parking server snapshot while {:?}", self.phase);
                self.parked = Some(messages);
                false
            }
        }
    }

    /// Insert the user message and an empty AI message ahead of the server
    pub fn begin_send(&mut self, text: &str) -> Result<&StreamSession> {
        let thread_id = self.thread_id.clone().ok_or(SyncError::NoThread)?;
        if self.phase != SyncPhase::Idle {
            return Err(SyncError::StreamInProgress(thread_id));
        }
        if text.trim().is_empty() {
            return Err(ClientError::InvalidInput("message must not be empty".to_string()).into());
        }

        let now = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let user_message_id = format!("{}{}-{}", USER_ID_PREFIX, now.timestamp_millis(), &suffix[..8]);
        let ai_message_id = format!("{}{}-{}", AI_ID_PREFIX, now.timestamp_millis(), &suffix[..8]);

        let mut user_message = Message::user(user_message_id.clone(), text);
        user_message.created_at = now;
        let mut ai_message = Message::ai_placeholder(ai_message_id.clone());
        ai_message.created_at = now;

        self.messages.push(user_message);
        self.messages.push(ai_message);
        self.pending.insert(user_message_id.clone());
        self.pending.insert(ai_message_id.clone());
        self.phase = SyncPhase::Optimistic;
        self.revision += 1;

        tracing::debug!("Optimistic send on thread {} ({})", thread_id, ai_message_id);
        Ok(&*self.session.insert(StreamSession {
            thread_id,
            user_message_id,
            ai_message_id,
            content: String::new(),
            is_streaming: true,
        }))
    }

    /// Append a streamed delta to the pending AI message `ai_id`
    ///
    /// Fails with [`SyncError::NoActiveSession`] unless `ai_id` belongs to the
    /// session that is still streaming, so a stream left behind by a thread
    /// switch cannot write into a newer session.
    pub fn append_content(&mut self, ai_id: &str, delta: &str) -> Result<()> {
        self.require_streaming(ai_id)?;
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == ai_id) {
            message.content.push_str(delta);
        }
        if let Some(session) = self.session.as_mut() {
            session.content.push_str(delta);
        }
        self.revision += 1;
        Ok(())
    }

    /// Replace the citation list of the pending AI message `ai_id`
    pub fn set_citations(&mut self, ai_id: &str, citations: Vec<Citation>) -> Result<()> {
        self.require_streaming(ai_id)?;
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == ai_id) {
            message.citations = Some(citations);
        }
        self.revision += 1;
        Ok(())
    }

    /// The transport of session `ai_id` closed, successfully or not
    pub fn end_stream(&mut self, ai_id: &str) -> Result<()> {
        self.require_streaming(ai_id)?;
        if let Some(session) = self.session.as_mut() {
            session.is_streaming = false;
        }
        self.phase = SyncPhase::Reconciling;
        Ok(())
    }

    /// Close the settle window and apply the newest parked snapshot
    ///
    /// Returns `true` when the local list changed. A call for any session other
    /// than the one in its settle window does nothing.
    pub fn settle(&mut self, ai_id: &str) -> bool {
        let owned = self
            .session
            .as_ref()
            .is_some_and(|s| s.ai_message_id == ai_id);
        if self.phase != SyncPhase::Reconciling || !owned {
            return false;
        }
        self.phase = SyncPhase::Idle;
        self.session = None;

        match self.parked.take() {
            Some(snapshot) => self.reconcile(snapshot),
            None => false,
        }
    }

    fn require_streaming(&self, ai_id: &str) -> Result<()> {
        match &self.session {
            Some(session) if session.is_streaming && session.ai_message_id == ai_id => Ok(()),
            _ => Err(SyncError::NoActiveSession),
        }
    }

    fn reconcile(&mut self, mut server: Vec<Message>) -> bool {
        sort_by_created_at(&mut server);
        let hash = fingerprint(&server);
        if self.fingerprint == Some(hash) {
            return false;
        }

        let mut local: HashMap<String, Message> = self
            .messages
            .drain(..)
            .filter(|m| self.pending.contains(&m.id))
            .map(|m| (m.id.clone(), m))
            .collect();

        let server_ids: HashSet<&str> = server.iter().map(|m| m.id.as_str()).collect();
        self.pending.retain(|id| server_ids.contains(id.as_str()));

        self.messages = server
            .into_iter()
            .map(|m| local.remove(&m.id).unwrap_or(m))
            .collect();
        self.fingerprint = Some(hash);
        self.revision += 1;

        tracing::debug!(
            "Reconciled {} messages ({} still pending)",
            self.messages.len(),
            self.pending.len()
        );
        true
    }
}

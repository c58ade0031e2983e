use std::pin::Pin;

use docchat_types::{Citation, StreamEvent};
use futures::{Stream, StreamExt};

use crate::error::Result;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Where a chat stream is in its read loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    AwaitingChunk,
    Decoding,
    Dispatching,
    Done,
    Error,
}

/// Receiver of decoded chat events
///
/// Content deltas are appended by the implementor. A citation event carries
/// the complete list for the current answer and replaces any earlier one.
pub trait ChatStreamHandler: Send {
    fn on_content(&mut self, delta: &str);

    fn on_citations(&mut self, citations: Vec<Citation>);

    /// Error reported inside the stream; the stream continues afterwards
    fn on_server_error(&mut self, message: &str) {
        tracing::warn!("Server reported error during chat stream: {}", message);
    }
}

/// What one drained chat stream delivered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub events: usize,
    pub content_chars: usize,
    pub citation_updates: usize,
    pub server_errors: Vec<String>,
    pub saw_done: bool,
}

/// Runs a decoded event stream into a [`ChatStreamHandler`]
pub struct ChatStreamDriver<H> {
    handler: H,
    state: DecoderState,
    summary: StreamSummary,
}

impl<H: ChatStreamHandler> ChatStreamDriver<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            state: DecoderState::AwaitingChunk,
            summary: StreamSummary::default(),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Route one event to the handler
    pub fn dispatch(&mut self, event: StreamEvent) {
        self.summary.events += 1;
        match event {
            StreamEvent::Message { content } => {
                self.summary.content_chars += content.chars().count();
                self.handler.on_content(&content);
            }
            StreamEvent::Citation { citations } => {
                self.summary.citation_updates += 1;
                self.handler.on_citations(citations);
            }
            StreamEvent::Error { message } => {
                self.handler.on_server_error(&message);
                self.summary.server_errors.push(message);
            }
            StreamEvent::Done => {
                self.summary.saw_done = true;
            }
        }
    }

    /// Drain the stream until the transport closes it
    ///
    /// A read error moves the driver to [`DecoderState::Error`] and is returned;
    /// events dispatched before it stay applied.
    pub async fn run(&mut self, mut stream: EventStream) -> Result<StreamSummary> {
        loop {
            self.state = DecoderState::AwaitingChunk;
            match stream.next().await {
                Some(Ok(event)) => {
                    self.state = DecoderState::Dispatching;
                    self.dispatch(event);
                }
                Some(Err(e)) => {
                    self.state = DecoderState::Error;
                    tracing::error!("Chat stream aborted: {}", e);
                    return Err(e);
                }
                None => {
                    self.state = DecoderState::Done;
                    tracing::debug!(
                        "Chat stream finished: {} events, {} chars",
                        self.summary.events,
                        self.summary.content_chars
                    );
                    return Ok(self.summary.clone());
                }
            }
        }
    }
}

/// Handler that collects the whole answer in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectingHandler {
    pub content: String,
    pub citations: Vec<Citation>,
    pub server_errors: Vec<String>,
}

impl ChatStreamHandler for CollectingHandler {
    fn on_content(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    fn on_citations(&mut self, citations: Vec<Citation>) {
        self.citations = citations;
    }

    fn on_server_error(&mut self, message: &str) {
        self.server_errors.push(message.to_string());
    }
}

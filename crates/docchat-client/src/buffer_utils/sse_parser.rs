use docchat_types::StreamEvent;
use futures::StreamExt;
use reqwest::Response;

use super::buffering::FrameBuffer;
use crate::error::{ClientError, Result};
use crate::streaming::{DecoderState, EventStream};

const DONE_MARKER: &str = "[DONE]";
const DATA_PREFIX: &str = "data: ";

/// Parse one complete SSE frame
///
/// Only a frame whose trimmed text starts with `data: ` carries an event;
/// anything else (comments, keep-alives, `event:` headers, blank frames)
/// yields `Ok(None)`. The literal `[DONE]` payload becomes
/// [`StreamEvent::Done`].
pub fn parse_frame(frame: &str) -> Result<Option<StreamEvent>> {
    let Some(payload) = frame.trim().strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };

    let payload = payload.trim();
    if payload == DONE_MARKER {
        return Ok(Some(StreamEvent::Done));
    }

    serde_json::from_str::<StreamEvent>(payload)
        .map(Some)
        .map_err(|e| ClientError::Decode(format!("{} in frame: {}", e, payload)))
}

/// Incremental decoder for the chat SSE body
///
/// Feed raw byte chunks in arrival order; complete frames come out in the
/// same order regardless of where the chunks were split. Malformed frames are
/// logged and dropped without affecting their neighbours.
pub struct SseDecoder {
    buffer: FrameBuffer,
    state: DecoderState,
    dropped: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            buffer: FrameBuffer::with_capacity(8192),
            state: DecoderState::AwaitingChunk,
            dropped: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Number of frames dropped as malformed so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Append a chunk and return every event completed by it
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.state = DecoderState::Decoding;
        self.buffer.extend(bytes);

        let mut events = Vec::new();
        while let Some(frame) = self.buffer.next_frame() {
            match frame.and_then(|frame| parse_frame(&frame)) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    self.dropped += 1;
                    tracing::warn!("Dropping malformed SSE frame: {}", e);
                }
            }
        }

        self.state = DecoderState::AwaitingChunk;
        events
    }

    /// Mark the body as finished
    ///
    /// A trailing frame without its blank-line delimiter is incomplete and is
    /// discarded, never dispatched.
    pub fn finish(&mut self) {
        let remainder = self.buffer.take_remainder();
        if !remainder.iter().all(u8::is_ascii_whitespace) {
            self.dropped += 1;
            tracing::debug!(
                "Discarding {} bytes of unterminated SSE frame at end of stream",
                remainder.len()
            );
        }
        self.state = DecoderState::Done;
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a chat response body into a stream of decoded events
///
/// A transport error while reading yields one `Err` and ends the stream.
pub fn parse_chat_stream(response: Response) -> EventStream {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut decoder = SseDecoder::new();

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    for event in decoder.push(&bytes) {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    tracing::error!("Chat stream read failed: {}", e);
                    yield Err(ClientError::Network(e));
                    break;
                }
            }
        }

        decoder.finish();
        tracing::debug!("Chat stream closed ({} frames dropped)", decoder.dropped());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_types::Citation;

    const BODY: &str = concat!(
        "data: {\"type\":\"message\",\"content\":\"Hi\"}\n\n",
        "data: {\"type\":\"message\",\"content\":\" th\u{e9}re\"}\n\n",
        "data: {\"type\":\"citation\",\"citations\":[{\"id\":\"f1\",\"title\":\"Doc\",\"page\":3}]}\n\n",
        "data: {\"type\":\"error\",\"message\":\"rate limited\"}\n\n",
        "data: [DONE]\n\n",
    );

    fn expected() -> Vec<StreamEvent> {
        vec![
            StreamEvent::Message { content: "Hi".to_string() },
            StreamEvent::Message { content: " th\u{e9}re".to_string() },
            StreamEvent::Citation { citations: vec![Citation::new("f1", "Doc", 3)] },
            StreamEvent::Error { message: "rate limited".to_string() },
            StreamEvent::Done,
        ]
    }

    fn decode_in_chunks(bytes: &[u8], chunk_size: usize) -> Vec<StreamEvent> {
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        for chunk in bytes.chunks(chunk_size) {
            events.extend(decoder.push(chunk));
        }
        decoder.finish();
        events
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let bytes = BODY.as_bytes();
        for chunk_size in 1..=bytes.len() {
            assert_eq!(
                decode_in_chunks(bytes, chunk_size),
                expected(),
                "chunk size {}",
                chunk_size
            );
        }
    }

    #[test]
    fn test_malformed_frames_dropped_in_isolation() {
        let body = concat!(
            "data: {\"type\":\"message\",\"content\":\"a\"}\n\n",
            "data: {not json\n\n",
            "data: {\"type\":\"message\",\"content\":\"b\"}\n\n",
            "data: {\"type\":\"thinking\",\"content\":\"?\"}\n\n",
            "data: {\"type\":\"message\",\"content\":\"c\"}\n\n",
        );
        let mut decoder = SseDecoder::new();
        let events = decoder.push(body.as_bytes());

        let contents: Vec<_> = events
            .iter()
            .map(|e| match e {
                StreamEvent::Message { content } => content.as_str(),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
        assert_eq!(decoder.dropped(), 2);
    }

    #[test]
    fn test_non_data_frames_ignored() {
        assert_eq!(parse_frame(": keep-alive").unwrap(), None);
        assert_eq!(parse_frame("event: ping").unwrap(), None);
        assert_eq!(parse_frame("   ").unwrap(), None);
    }

    #[test]
    fn test_frame_must_open_with_data_field() {
        let message = "{\"type\":\"message\",\"content\":\"x\"}";
        assert_eq!(parse_frame(&format!("event: x\ndata: {}", message)).unwrap(), None);
        assert_eq!(parse_frame(&format!("data:{}", message)).unwrap(), None);
        assert_eq!(
            parse_frame(&format!("\r\ndata: {}\r\n", message)).unwrap(),
            Some(StreamEvent::Message { content: "x".to_string() })
        );
    }

    #[test]
    fn test_done_marker_and_done_event() {
        assert_eq!(parse_frame("data: [DONE]").unwrap(), Some(StreamEvent::Done));
        assert_eq!(
            parse_frame("data: {\"type\":\"done\"}").unwrap(),
            Some(StreamEvent::Done)
        );
    }

    #[test]
    fn test_unterminated_frame_not_dispatched() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"type\":\"message\",\"content\":\"cut\"}");
        assert!(events.is_empty());

        decoder.finish();
        assert_eq!(decoder.state(), DecoderState::Done);
        assert_eq!(decoder.dropped(), 1);
    }

    #[test]
    fn test_state_after_push() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: [DONE]\n\n");
        assert_eq!(decoder.state(), DecoderState::AwaitingChunk);
    }
}

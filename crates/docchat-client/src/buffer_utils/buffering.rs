use std::collections::VecDeque;

use crate::error::{ClientError, Result};

/// Byte buffer that releases one SSE frame at a time
///
/// Frames are delimited by a blank line (`\n\n` or `\r\n\r\n`). Bytes after the
/// last delimiter stay buffered until the rest of the frame arrives, so a
/// frame split across network packets is only released once complete. UTF-8 is
/// decoded per complete frame, which keeps multi-byte characters split across
/// packets intact.
pub struct FrameBuffer {
    buffer: VecDeque<u8>,
}

impl FrameBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete frame, without its delimiter
    ///
    /// Returns None if no complete frame is buffered yet
    pub fn next_frame(&mut self) -> Option<Result<String>> {
        let (end, delimiter_len) = find_delimiter(self.buffer.make_contiguous())?;

        let frame_bytes: Vec<u8> = self.buffer.drain(..end).collect();
        self.buffer.drain(..delimiter_len);

        Some(
            String::from_utf8(frame_bytes)
                .map_err(|e| ClientError::Decode(format!("Invalid UTF-8 in frame: {}", e))),
        )
    }

    /// Take whatever is left; used when the body ends without a final delimiter
    pub fn take_remainder(&mut self) -> Vec<u8> {
        self.buffer.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn find_delimiter(bytes: &[u8]) -> Option<(usize, usize)> {
    (0..bytes.len()).find_map(|i| {
        let rest = &bytes[i..];
        if rest.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else if rest.starts_with(b"\n\n") {
            Some((i, 2))
        } else {
            None
        }
    })
}

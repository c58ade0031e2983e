mod buffering;
mod sse_parser;

pub use buffering::FrameBuffer;
pub use sse_parser::{parse_chat_stream, parse_frame, SseDecoder};

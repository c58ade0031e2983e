pub mod buffer_utils;
pub mod client;
pub mod config;
pub mod error;
pub mod resources;
pub mod session;
pub mod streaming;
pub mod traits;

pub use buffer_utils::{parse_chat_stream, parse_frame, FrameBuffer, SseDecoder};
pub use client::{ApiClient, ApiClientBuilder};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use session::{Session, SessionEvent};
pub use streaming::{
    ChatStreamDriver, ChatStreamHandler, CollectingHandler, DecoderState, EventStream,
    StreamSummary,
};
pub use traits::ChatApi;

pub use reqwest::StatusCode;

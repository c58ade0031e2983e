//! # Docchat
//!
//! Client SDK for a document-chat service: folders hold uploaded documents and
//! chat threads, and each question streams back an answer with citations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docchat::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let context = AppContext::builder()
//!         .base_url("http://localhost:8000")
//!         .build()?;
//!
//!     context
//!         .client()
//!         .login(&LoginData {
//!             email: "ana@example.com".to_string(),
//!             password: "secret".to_string(),
//!         })
//!         .await?;
//!
//!     let chat = context.chat_session();
//!     chat.open_thread("thread-id").await?;
//!     chat.send("What does chapter 2 conclude?").await?;
//!
//!     for message in chat.messages() {
//!         println!("{:?}: {}", message.role, message.content);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`docchat-types`**: wire types (threads, messages, citations, stream events)
//! - **`docchat-client`**: HTTP transport, SSE decoding, resource endpoints, identity session
//! - **`docchat-sync`**: optimistic thread reconciliation, query cache, app context
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use docchat_types::{
    initials, Citation, CreateThreadData, FileRecord, FileStatus, FileUploadResponse, Folder,
    FolderCollaborator, LoginData, Message, OtpVerifyData, RegistrationData, ResendOtpData, Role,
    StreamEvent, Thread, UpdateThreadData, User, UserSearchResult,
};

pub use docchat_client::{
    parse_chat_stream, ApiClient, ApiClientBuilder, ChatApi, ChatStreamDriver, ChatStreamHandler,
    ClientConfig, ClientError, CollectingHandler, EventStream, FrameBuffer, Session, SessionEvent,
    StreamSummary,
};

pub use docchat_sync::{
    AppContext, AppContextBuilder, CachedApi, ChatSession, Mutation, Notice, NoticeLevel, Notifier,
    QueryCache, QueryKey, SyncError, SyncPhase, SyncSettings, ThreadPoller, ThreadSync, UserSearch,
};

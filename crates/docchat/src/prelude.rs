//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use docchat::prelude::*;
//! ```

pub use crate::{
    ApiClient, AppContext, ChatSession, ChatStreamHandler, Citation, ClientConfig, ClientError,
    CreateThreadData, Folder, LoginData, Message, Notice, NoticeLevel, Role, StreamEvent,
    SyncError, SyncSettings, Thread, User,
};

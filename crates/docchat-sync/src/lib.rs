//! Client-side state for docchat: optimistic thread synchronization, the
//! chat-turn driver, a keyed query cache with mutation invalidation, and the
//! application context that ties them to one signed-in session.

pub mod builder;
pub mod cache;
pub mod cached_api;
pub mod chat;
pub mod context;
pub mod error;
pub mod notice;
pub mod poller;
pub mod reconciler;
pub mod search;
pub mod settings;

pub use builder::AppContextBuilder;
pub use cache::{InvalidationPlan, Mutation, QueryCache, QueryKey};
pub use cached_api::CachedApi;
pub use chat::{ChatSession, ThreadSyncHandler};
pub use context::{AppContext, FileSelection, SidebarState};
pub use error::{Result, SyncError};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use poller::ThreadPoller;
pub use reconciler::{StreamSession, SyncPhase, ThreadSync};
pub use search::{UserDirectory, UserSearch};
pub use settings::SyncSettings;

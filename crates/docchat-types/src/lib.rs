//! Core types for the docchat client.
//!
//! Wire shapes mirror the document-chat API: camelCase fields on most
//! resources, with snake_case aliases where the server is inconsistent.

pub mod events;
pub mod folder;
pub mod message;
pub mod requests;
pub mod thread;
pub mod timestamp;
pub mod user;

pub use events::StreamEvent;
pub use folder::{FileRecord, FileStatus, FileUploadResponse, Folder, FolderCollaborator};
pub use message::{Citation, Message, Role};
pub use requests::{
    ChatData, CreateThreadData, CreateThreadResponse, LoginData, OtpVerifyData, RegistrationData,
    ResendOtpData, UpdateFolderData, UpdateThreadData, UpdateThreadResponse,
};
pub use thread::Thread;
pub use user::{initials, AuthResponse, User, UserSearchResult};

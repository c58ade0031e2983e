use docchat_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("A chat stream is already active on thread {0}")]
    StreamInProgress(String),

    #[error("No active stream session")]
    NoActiveSession,

    #[error("No thread selected")]
    NoThread,

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SyncError {
    /// Whether the error ended the signed-in session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Client(e) if e.is_unauthorized())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

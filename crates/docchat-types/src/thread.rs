use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;

/// A chat conversation owned by a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    #[serde(alias = "thread_id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "folder_id")]
    pub folder_id: Option<String>,
    /// Absent on listing endpoints
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(
        default,
        alias = "created_at",
        deserialize_with = "crate::timestamp::option::deserialize"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "updated_at",
        deserialize_with = "crate::timestamp::option::deserialize"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    /// Only filled by the recent-threads listing
    #[serde(default, alias = "folder_name", skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
}

/// Envelope of `GET /thread/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadEnvelope {
    pub thread: Option<Thread>,
}

/// Envelope of the thread listing endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadListEnvelope {
    #[serde(default)]
    pub threads: Vec<Thread>,
}

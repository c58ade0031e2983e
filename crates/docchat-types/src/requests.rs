use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateThreadData {
    pub folder_id: String,
    pub thread_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadResponse {
    #[serde(alias = "thread_id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "folder_id")]
    pub folder_id: Option<String>,
    #[serde(
        default,
        alias = "created_at",
        deserialize_with = "crate::timestamp::option::deserialize"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateThreadData {
    pub thread_id: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateThreadResponse {
    #[serde(alias = "thread_id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "folder_id")]
    pub folder_id: Option<String>,
    #[serde(
        default,
        alias = "updated_at",
        deserialize_with = "crate::timestamp::option::deserialize"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFolderData {
    pub new_name: String,
}

/// Body of `POST /thread/{id}/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatData {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationData {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpVerifyData {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendOtpData {
    pub email: String,
}

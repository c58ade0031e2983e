use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thread::Thread;

/// Organizational container for threads and uploaded files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(alias = "folder_id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "created_by")]
    pub created_by: Option<String>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<Vec<Thread>>,
}

/// Uploaded document metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(alias = "file_id")]
    pub id: String,
    pub filename: String,
    #[serde(default, alias = "uploader_id")]
    pub uploader_id: Option<String>,
    #[serde(default, alias = "folder_id")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "file_url")]
    pub file_url: Option<String>,
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
    #[serde(default, alias = "folder_name")]
    pub folder_name: Option<String>,
    #[serde(default, alias = "uploader_name")]
    pub uploader_name: Option<String>,
    #[serde(default, alias = "file_size")]
    pub file_size: Option<u64>,
    #[serde(default, alias = "page_count")]
    pub page_count: Option<u32>,
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
}

/// Response of `POST /file/upload`; processing continues server-side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub file_id: String,
    pub filename: String,
    pub status: String,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Response of `GET /file/status/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    pub file_id: String,
    pub filename: String,
    pub status: String,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::timestamp::option::deserialize")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl FileStatus {
    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case("pending")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCollaborator {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, alias = "is_owner")]
    pub is_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_listing_shape() {
        let json = r#"[{"folder_id": "f1", "name": "Papers", "created_by": "u1"}]"#;
        let folders: Vec<Folder> = serde_json::from_str(json).unwrap();

        assert_eq!(folders[0].id, "f1");
        assert_eq!(folders[0].created_by.as_deref(), Some("u1"));
    }

    #[test]
    fn test_file_details_shape() {
        let json = r#"{
            "id": "x1",
            "filename": "report.pdf",
            "status": "COMPLETED",
            "file_url": null,
            "created_at": "2024-05-01T12:00:00",
            "folder_name": "Papers",
            "uploader_name": "ana@example.com",
            "type": ".pdf"
        }"#;
        let file: FileRecord = serde_json::from_str(json).unwrap();

        assert_eq!(file.file_type.as_deref(), Some(".pdf"));
        assert_eq!(file.uploader_name.as_deref(), Some("ana@example.com"));
        assert!(file.file_url.is_none());
    }

    #[test]
    fn test_file_status_pending() {
        let json = r#"{"file_id":"x1","filename":"a.pdf","status":"PENDING","uploaded_at":"2024-05-01T12:00:00"}"#;
        let status: FileStatus = serde_json::from_str(json).unwrap();
        assert!(status.is_pending());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message within a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Ai,
}

/// Reference from an AI answer to a page of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub title: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, alias = "totalPages", skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, alias = "fileSize", skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl Citation {
    pub fn new(id: impl Into<String>, title: impl Into<String>, page: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            page,
            content: None,
            total_pages: None,
            file_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(alias = "created_at", deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl Message {
    /// User message stamped with the current time
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            citations: None,
        }
    }

    /// Empty AI message, the placeholder a streamed answer is appended to
    pub fn ai_placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Ai,
            content: String::new(),
            created_at: Utc::now(),
            citations: None,
        }
    }

    pub fn is_ai(&self) -> bool {
        self.role == Role::Ai
    }

    pub fn citations(&self) -> &[Citation] {
        self.citations.as_deref().unwrap_or_default()
    }
}

/// Stable ordering used everywhere a server history is displayed
pub fn sort_by_created_at(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"USER\"");
        assert_eq!(serde_json::to_string(&Role::Ai).unwrap(), "\"AI\"");
    }

    #[test]
    fn test_message_deserialization() {
        let json = r#"{
            "id": "m1",
            "role": "AI",
            "content": "See page 3",
            "createdAt": "2024-05-01T12:00:00.000Z",
            "citations": [{"id": "f1", "title": "Doc", "page": 3, "total_pages": 10}]
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();

        assert!(msg.is_ai());
        assert_eq!(msg.citations().len(), 1);
        assert_eq!(msg.citations()[0].total_pages, Some(10));
    }

    #[test]
    fn test_message_without_citations() {
        let json = r#"{"id":"m2","role":"USER","content":"Hi","createdAt":"2024-05-01T12:00:00"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();

        assert_eq!(msg.role, Role::User);
        assert!(msg.citations().is_empty());
    }

    #[test]
    fn test_sort_by_created_at() {
        let mut late = Message::user("b", "second");
        let mut early = Message::user("a", "first");
        early.created_at = crate::timestamp::parse("2024-01-01T00:00:00Z").unwrap();
        late.created_at = crate::timestamp::parse("2024-01-02T00:00:00Z").unwrap();

        let mut list = vec![late, early];
        sort_by_created_at(&mut list);
        assert_eq!(list[0].id, "a");
    }
}

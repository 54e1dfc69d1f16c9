use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Untitled Document";

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// A persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    /// Serialized document tree; empty for a never-edited document
    #[serde(default)]
    pub content: String,
}

/// Fields a client sends on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl DocumentDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn into_record(self, id: impl Into<String>) -> DocumentRecord {
        DocumentRecord {
            id: id.into(),
            title: self.title,
            content: self.content,
        }
    }
}

impl Default for DocumentDraft {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, "")
    }
}

/// List entry; the full record deserializes into this as well
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
}

impl From<&DocumentRecord> for DocumentSummary {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
        }
    }
}

/// Identifiers are generated uuids; anything outside this alphabet can only
/// be a lookup miss.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

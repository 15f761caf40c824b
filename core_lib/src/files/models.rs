use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Fixed page size for file listings.
pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Folder,
    File,
    Image,
}

impl FileType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "folder" => Some(FileType::Folder),
            "file" => Some(FileType::File),
            "image" => Some(FileType::Image),
            _ => None,
        }
    }

    /// Folders never carry content; files and images always do.
    pub fn has_content(self) -> bool {
        !matches!(self, FileType::Folder)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Folder => write!(f, "folder"),
            FileType::File => write!(f, "file"),
            FileType::Image => write!(f, "image"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid identifier: {0}")]
pub struct InvalidIdentifier(pub String);

/// Parent reference: either the root sentinel or an existing folder.
/// Serialized as `"0"` / the folder id on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    Root,
    Folder(Uuid),
}

impl ParentRef {
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
        if raw == "0" {
            return Ok(ParentRef::Root);
        }

        Uuid::parse_str(raw)
            .map(ParentRef::Folder)
            .map_err(|_| InvalidIdentifier(raw.to_string()))
    }

    /// Accepts the JSON forms clients send: the number `0`, the string
    /// `"0"`, or a folder id string.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, InvalidIdentifier> {
        match value {
            serde_json::Value::Number(n) if n.as_u64() == Some(0) => Ok(ParentRef::Root),
            serde_json::Value::String(s) => Self::parse(s),
            other => Err(InvalidIdentifier(other.to_string())),
        }
    }

    pub fn as_wire(&self) -> String {
        match self {
            ParentRef::Root => "0".to_string(),
            ParentRef::Folder(id) => id.to_string(),
        }
    }

    pub fn folder_id(&self) -> Option<Uuid> {
        match self {
            ParentRef::Root => None,
            ParentRef::Folder(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub file_type: FileType,
    pub is_public: bool,
    pub parent: ParentRef,
    /// Opaque reference to the stored bytes; `None` for folders.
    pub content_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Wire representation of a file record. Storage details never leave the
/// service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub is_public: bool,
    pub parent_id: String,
}

impl From<File> for FileResponse {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            user_id: file.owner_id,
            name: file.name,
            file_type: file.file_type,
            is_public: file.is_public,
            parent_id: file.parent.as_wire(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    /// Raw JSON so the handler can accept `0`, `"0"`, or an id string.
    pub parent_id: Option<serde_json::Value>,
    pub is_public: Option<bool>,
    pub data: Option<String>,
}

/// Listing filter: always scoped to an owner, optionally to one folder.
#[derive(Debug, Clone, Copy)]
pub struct FileFilter {
    pub owner_id: Uuid,
    pub parent_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_ref_parses_sentinel_and_ids() {
        assert_eq!(ParentRef::parse("0"), Ok(ParentRef::Root));

        let id = Uuid::new_v4();
        assert_eq!(ParentRef::parse(&id.to_string()), Ok(ParentRef::Folder(id)));

        assert!(ParentRef::parse("not-an-id").is_err());
        assert!(ParentRef::parse("").is_err());
    }

    #[test]
    fn parent_ref_accepts_json_forms() {
        assert_eq!(
            ParentRef::from_value(&serde_json::json!(0)),
            Ok(ParentRef::Root)
        );
        assert_eq!(
            ParentRef::from_value(&serde_json::json!("0")),
            Ok(ParentRef::Root)
        );

        let id = Uuid::new_v4();
        assert_eq!(
            ParentRef::from_value(&serde_json::json!(id.to_string())),
            Ok(ParentRef::Folder(id))
        );

        assert!(ParentRef::from_value(&serde_json::json!(7)).is_err());
        assert!(ParentRef::from_value(&serde_json::json!(null)).is_err());
    }

    #[test]
    fn file_type_parse_round_trips() {
        for raw in ["folder", "file", "image"] {
            assert_eq!(FileType::parse(raw).unwrap().to_string(), raw);
        }
        assert!(FileType::parse("directory").is_none());

        assert!(!FileType::Folder.has_content());
        assert!(FileType::File.has_content());
        assert!(FileType::Image.has_content());
    }

    #[test]
    fn response_uses_wire_field_names() {
        let file = File {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "a.png".to_string(),
            file_type: FileType::Image,
            is_public: false,
            parent: ParentRef::Root,
            content_ref: Some("ref".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(FileResponse::from(file)).unwrap();
        assert_eq!(json["parentId"], "0");
        assert_eq!(json["type"], "image");
        assert_eq!(json["isPublic"], false);
        assert!(json.get("contentRef").is_none());
        assert!(json.get("content_ref").is_none());
    }
}

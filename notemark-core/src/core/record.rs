//! Records persisted in the note store.

use crate::ContentKind;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Anything addressed by a string id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// The collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Files,
    Notes,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Notes => "notes",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type stored as a JSON document in one collection, keyed by its id.
pub trait Record: Identified + Serialize + DeserializeOwned {
    const COLLECTION: Collection;
}

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An uploaded file blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub create_at: i64,
}

impl FileRecord {
    /// A new file with a fresh id and the current timestamp.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
            create_at: now_millis(),
        }
    }
}

impl Identified for FileRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for FileRecord {
    const COLLECTION: Collection = Collection::Files;
}

/// One entry of a note's `contents` list: a marker embedded in its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRef {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub kind: ContentKind,
    pub name: String,
}

impl Identified for ContentRef {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A note. `content` is the serialized rich text.
///
/// Fields this build does not know about are kept in `extra` and written
/// back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub contents: Vec<ContentRef>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NoteRecord {
    /// A new note with a fresh id, created now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            create_at: now,
            update_at: now,
            contents: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Marks the note as modified now.
    pub fn touch(&mut self) {
        self.update_at = now_millis();
    }
}

impl Identified for NoteRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for NoteRecord {
    const COLLECTION: Collection = Collection::Notes;
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Encodes bytes the same way file records store them.
pub fn encode_blob(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

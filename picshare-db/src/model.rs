//! Image records and their document form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A stored record: a JSON object, keyed by field name.
pub type Document = Map<String, Value>;

/// Field holding the store-generated key.
pub const ID_FIELD: &str = "id";

/// Field holding the server-assigned creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Counter field incremented by likes.
pub const LIKES_FIELD: &str = "likes";

/// Image record.
///
/// `id` and `created_at` are assigned on save; whatever the caller sends
/// for them is discarded. Fields the server does not know about (`url`,
/// `description`, `userId`, ...) are kept in `fields` untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub likes: i64,

    #[serde(flatten)]
    pub fields: Document,
}

impl Image {
    /// Build an image from caller-submitted fields.
    ///
    /// Drops `id` and `createdAt`; a non-integer `likes` falls back to 0.
    pub fn from_submission(fields: Document) -> Self {
        let mut image = Self {
            fields,
            ..Self::default()
        };
        image.lift_server_fields();
        image
    }

    /// Move server-owned keys out of `fields`.
    ///
    /// `id` and `createdAt` found there are dropped. An integer `likes`
    /// replaces the typed counter, any other `likes` value is dropped.
    pub fn lift_server_fields(&mut self) {
        self.fields.remove(ID_FIELD);
        self.fields.remove(CREATED_AT_FIELD);
        if let Some(likes) = self.fields.remove(LIKES_FIELD) {
            self.likes = likes.as_i64().unwrap_or(0);
        }
    }

    /// Decode a stored document.
    pub fn from_document(doc: Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }

    /// Encode for storage.
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            // Image always serializes to an object
            _ => Ok(Document::new()),
        }
    }

    /// Look up a caller-supplied field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Set the `id` field of a document, replacing any previous value.
pub fn with_id(mut doc: Document, id: impl Into<String>) -> Document {
    doc.insert(ID_FIELD.to_owned(), Value::String(id.into()));
    doc
}

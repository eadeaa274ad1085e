use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        f.write_str(s)
    }
}

/// A citation attached to an answer.
///
/// The payload is opaque to the client: every field is optional and unknown
/// fields are carried through untouched in `extra`. Deserializing never
/// fails; a known field with an unexpected shape stays in `extra` under its
/// own key.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Source {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Source {
    /// Builds a source from any JSON value. A non-object value is kept in
    /// `extra` under `"value"`.
    pub fn from_json(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => Map::from_iter([("value".to_string(), other)]),
        };
        Self {
            title: take_field(&mut fields, "title"),
            filename: take_field(&mut fields, "filename"),
            url: take_field(&mut fields, "url"),
            kind: take_field(&mut fields, "type"),
            authors: take_field(&mut fields, "authors"),
            year: take_field(&mut fields, "year"),
            citation_count: take_field(&mut fields, "citation_count"),
            content: take_field(&mut fields, "content"),
            extra: fields,
        }
    }

    /// Web citations are rendered as links; document chunks as excerpts.
    pub fn is_web(&self) -> bool {
        self.kind.as_deref() == Some("websearch") || self.url.is_some()
    }

    /// Best human-readable label for this source.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.filename.as_deref())
            .or(self.url.as_deref())
            .unwrap_or("Untitled")
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Source::from_json)
    }
}

/// Moves `key` out of `fields` when it has the expected shape. Nulls are
/// dropped; anything else that does not fit is left in place.
fn take_field<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    match fields.get(key)? {
        Value::Null => {
            fields.remove(key);
            None
        }
        value => {
            let parsed = serde_json::from_value(value.clone()).ok()?;
            fields.remove(key);
            Some(parsed)
        }
    }
}

/// A chat message as seen by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub sources: Vec<Source>,
    pub timestamp: DateTime<Utc>,
    pub streaming: bool,
}

impl Message {
    pub(crate) fn new(role: Role, content: String, streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            sources: Vec::new(),
            timestamp: Utc::now(),
            streaming,
        }
    }

    /// The `{role, content}` pair sent back to the server as history.
    pub fn as_turn(&self) -> ConversationTurn {
        ConversationTurn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// One prior exchange included in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// Schemaless documents and the typed-record boundary
///
/// The store persists documents as JSON objects grouped into collections.
/// Every document crossing the store boundary is decoded into a typed record
/// (`UserRecord`, `TaskRecord`) before it is used; anything that does not fit
/// the record shape is rejected with a [`DecodeError`].
///
/// # Collections
///
/// | Collection | Keying                      | Record       |
/// |------------|-----------------------------|--------------|
/// | `users`    | the owner's session identity | `UserRecord` |
/// | `tasks`    | store-generated identity     | `TaskRecord` |
///
/// # Example
///
/// ```
/// use taskboard_shared::models::document::{Collection, Document};
/// use taskboard_shared::models::task::TaskRecord;
/// use uuid::Uuid;
///
/// let record = TaskRecord::new("buy milk", Uuid::new_v4());
/// let document: Document = record.to_document();
/// let decoded = TaskRecord::from_document(&document).unwrap();
///
/// assert_eq!(decoded.text, "buy milk");
/// assert_eq!(Collection::Tasks.as_str(), "tasks");
/// ```

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A schemaless document body (a JSON object)
pub type Document = Map<String, Value>;

/// Error raised when a document does not match the expected record shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Document fields are missing or have the wrong type
    #[error("Malformed {collection} document: {reason}")]
    Malformed {
        collection: Collection,
        reason: String,
    },

    /// Document violates a record constraint (e.g. oversized image)
    #[error("Invalid {collection} document: {reason}")]
    Invalid {
        collection: Collection,
        reason: String,
    },

    /// Unknown collection name
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}

/// Logical collections held by the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// One document per user, keyed by session identity
    Users,

    /// Task documents, keyed by store-generated identity
    Tasks,
}

impl Collection {
    /// Gets the collection name used on the wire and in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Collection::Users),
            "tasks" => Ok(Collection::Tasks),
            other => Err(DecodeError::UnknownCollection(other.to_string())),
        }
    }
}

/// A document together with its store identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Store identity
    pub id: Uuid,

    /// Document body
    pub data: Document,
}

impl StoredDocument {
    /// Creates a stored document
    pub fn new(id: Uuid, data: Document) -> Self {
        Self { id, data }
    }
}

/// Decodes a document body into a typed record
///
/// Used by the record types to implement `from_document`.
pub(crate) fn decode<T: DeserializeOwned>(
    collection: Collection,
    document: &Document,
) -> Result<T, DecodeError> {
    serde_json::from_value(Value::Object(document.clone())).map_err(|e| DecodeError::Malformed {
        collection,
        reason: e.to_string(),
    })
}

/// Encodes a typed record into a document body
pub(crate) fn encode<T: Serialize>(record: &T) -> Document {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        // Records are plain structs and always serialize to objects
        _ => Map::new(),
    }
}

/// Applies a merge-write to a document body
///
/// Top-level fields in `fields` replace the corresponding fields in `base`;
/// all other fields of `base` are left untouched.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use taskboard_shared::models::document::{merge_fields, Document};
///
/// let mut base: Document = json!({"name": "Ada", "email": "ada@example.com"})
///     .as_object().unwrap().clone();
/// let fields: Document = json!({"profileImage": "aGVsbG8="}).as_object().unwrap().clone();
///
/// merge_fields(&mut base, &fields);
/// assert_eq!(base.len(), 3);
/// ```
pub fn merge_fields(base: &mut Document, fields: &Document) {
    for (key, value) in fields {
        base.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_round_trip() {
        assert_eq!("users".parse::<Collection>().unwrap(), Collection::Users);
        assert_eq!("tasks".parse::<Collection>().unwrap(), Collection::Tasks);
        assert_eq!(Collection::Tasks.to_string(), "tasks");
    }

    #[test]
    fn test_unknown_collection() {
        let err = "projects".parse::<Collection>().unwrap_err();
        assert_eq!(err, DecodeError::UnknownCollection("projects".to_string()));
    }

    #[test]
    fn test_merge_overwrites_only_given_fields() {
        let mut base = json!({"a": 1, "b": 2}).as_object().unwrap().clone();
        let fields = json!({"b": 3, "c": 4}).as_object().unwrap().clone();

        merge_fields(&mut base, &fields);

        assert_eq!(base["a"], 1);
        assert_eq!(base["b"], 3);
        assert_eq!(base["c"], 4);
    }
}

/// Task record stored in the `tasks` collection
///
/// # Document Shape
///
/// ```json
/// {
///   "text": "buy milk",
///   "completed": false,
///   "uid": "6f1c1f0e-...-owner"
/// }
/// ```
///
/// The document id is the task's store identity and is never part of the
/// body. Extra fields written by older clients are ignored on decode.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{self, Collection, DecodeError, Document};

/// Name of the owner field, used for the per-user query filter
pub const OWNER_FIELD: &str = "uid";

/// Typed body of a task document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Free-text content
    pub text: String,

    /// Completion flag
    pub completed: bool,

    /// Owning user's session identity
    pub uid: Uuid,
}

impl TaskRecord {
    /// Creates a new, not yet completed task record
    pub fn new(text: impl Into<String>, owner: Uuid) -> Self {
        Self {
            text: text.into(),
            completed: false,
            uid: owner,
        }
    }

    /// Decodes a task document
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::Malformed` if `text`, `completed` or `uid` is
    /// missing or has the wrong type.
    pub fn from_document(document: &Document) -> Result<Self, DecodeError> {
        document::decode(Collection::Tasks, document)
    }

    /// Encodes the record as a document body
    pub fn to_document(&self) -> Document {
        document::encode(self)
    }
}

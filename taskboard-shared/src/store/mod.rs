/// Document store and authentication service contracts
///
/// These traits are the seam between the sync layer and whatever backs it:
/// the hosted Taskboard service over HTTP, Postgres inside that service, or
/// an in-process store for tests.
///
/// # Operations
///
/// ```text
/// DocumentStore                         AuthService
/// ├── create_record(c, data) -> id      ├── sign_in_with_provider(cred)
/// ├── read_record(c, id)                ├── sign_in_with_password(email, pw)
/// ├── write_record(c, id, data)         ├── register_with_password(name, email, pw)
/// ├── merge_record(c, id, fields)       ├── send_password_reset(email)
/// ├── delete_record(c, id)              ├── sign_out()
/// └── query_records(c, field, value)    └── observe_auth_state()
/// ```
///
/// Every operation is a single awaited request. Failures surface as
/// [`StoreError`]; nothing is retried.

pub mod auth;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::authorization::AuthzError;
use crate::models::document::{Collection, DecodeError, Document, StoredDocument};

pub use auth::{AuthService, AuthState, AuthUser, ProviderCredential};
pub use memory::MemoryStore;

/// Store error taxonomy
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Credentials rejected or account problem during sign-in/registration
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// No valid session for a call that needs one
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session is valid but not allowed to touch the document
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Document or account does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation (e.g. email already registered)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Document did not match its record shape
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Request rejected by validation
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Transport failure (connection refused, timeout, bad response)
    #[error("Network failure: {0}")]
    Network(String),

    /// Backend reported an internal failure
    #[error("Store failure: {0}")]
    Internal(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Document not found".to_string()),
            other => StoreError::Internal(format!("Database error: {}", other)),
        }
    }
}

impl From<AuthzError> for StoreError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotOwner => StoreError::Forbidden(err.to_string()),
            AuthzError::NotAllowed(msg) => StoreError::Forbidden(msg),
            AuthzError::Decode(e) => StoreError::Decode(e),
        }
    }
}

/// Remote document store
///
/// Implementations are last-writer-wins: every write is an independent
/// overwrite with no version check.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns its generated identity
    async fn create_record(&self, collection: Collection, data: Document) -> StoreResult<Uuid>;

    /// Reads a document, `None` if absent
    async fn read_record(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> StoreResult<Option<StoredDocument>>;

    /// Overwrites (or creates) the document at `id`
    async fn write_record(&self, collection: Collection, id: Uuid, data: Document) -> StoreResult<()>;

    /// Merge-writes `fields` onto the document at `id`, creating it if absent
    async fn merge_record(&self, collection: Collection, id: Uuid, fields: Document) -> StoreResult<()>;

    /// Deletes the document at `id`; deleting an absent document succeeds
    async fn delete_record(&self, collection: Collection, id: Uuid) -> StoreResult<()>;

    /// Returns all documents whose top-level `field` equals `value`
    ///
    /// Results come back in store order (creation order for the bundled
    /// implementations).
    async fn query_records(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<StoredDocument>>;
}

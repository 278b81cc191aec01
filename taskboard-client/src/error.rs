/// Client-side error taxonomy
///
/// Every failure a sync component can report is a [`SyncError`]. Store
/// failures are folded in from [`StoreError`]:
///
/// | StoreError                              | SyncError     |
/// |-----------------------------------------|---------------|
/// | `AuthFailure`, `Unauthorized`, `Forbidden` | `Auth`     |
/// | `NotFound`                              | `NotFound`    |
/// | `Decode`                                | `Decode`      |
/// | `Conflict`, `Rejected`                  | `Rejected`    |
/// | `Network`, `Internal`                   | `Network`     |

use taskboard_shared::models::document::DecodeError;
use taskboard_shared::store::StoreError;

/// Inline message shown when a profile image is too large
pub const SIZE_LIMIT_MESSAGE: &str = "Image size should not exceed 1MB.";

/// Error type for sync components
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Sign-in, registration or permission failure
    #[error("{0}")]
    Auth(String),

    /// Profile image over the size cap; no request was made
    #[error("Image size should not exceed 1MB.")]
    SizeLimitExceeded { size: usize },

    /// The store could not be reached or failed internally
    #[error("Network failure: {0}")]
    Network(String),

    /// Document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document did not match its record shape
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The store refused the request
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Operation needs a signed-in user
    #[error("No active session")]
    NoSession,

    /// Index does not address a task in the local cache
    #[error("Task index {index} is out of range (list has {len} tasks)")]
    IndexOutOfRange { index: usize, len: usize },
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AuthFailure(msg)
            | StoreError::Unauthorized(msg)
            | StoreError::Forbidden(msg) => SyncError::Auth(msg),
            StoreError::NotFound(msg) => SyncError::NotFound(msg),
            StoreError::Decode(e) => SyncError::Decode(e),
            StoreError::Conflict(msg) | StoreError::Rejected(msg) => SyncError::Rejected(msg),
            StoreError::Network(msg) | StoreError::Internal(msg) => SyncError::Network(msg),
        }
    }
}

/// Sync result type alias
pub type SyncResult<T> = Result<T, SyncError>;

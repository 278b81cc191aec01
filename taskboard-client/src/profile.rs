/// Profile Sync
///
/// Uploads a profile picture to the signed-in user's `users/{uid}` document
/// and keeps the displayed picture in step with it.
///
/// An upload is rejected before any request when the file is larger than
/// 1 MiB; the inline error message is set and nothing is written. A
/// successful upload is exactly one merge-write of `{profileImage}`, after
/// which the display shows the local encoding (the store is not re-read).
/// There is no way to delete a stored picture.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskboard_shared::models::document::Collection;
use taskboard_shared::models::user::{
    encode_profile_image, UserPatch, MAX_PROFILE_IMAGE_BYTES, PROFILE_IMAGE_FIELD,
};
use taskboard_shared::store::DocumentStore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult, SIZE_LIMIT_MESSAGE};

/// A picked image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Where the file came from, for logging
    pub path: PathBuf,

    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    /// Reads an image from disk
    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(path, bytes))
    }

    /// File size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// What the profile area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileDisplay {
    /// The stored picture, as a `data:` URI
    Image { data_uri: String },

    /// No picture yet
    Placeholder,
}

/// Result of an upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// No file was selected; nothing happened
    NothingPending,

    /// The picture was stored
    Uploaded,
}

/// Profile picture state for one user
pub struct ProfileSync {
    store: Arc<dyn DocumentStore>,
    uid: Uuid,
    pending: Option<ImageFile>,
    image: Option<String>,
    error_message: Option<String>,
}

impl ProfileSync {
    pub fn new(store: Arc<dyn DocumentStore>, uid: Uuid) -> Self {
        Self {
            store,
            uid,
            pending: None,
            image: None,
            error_message: None,
        }
    }

    /// Reads the stored picture for the user, if any
    pub async fn load(&mut self) -> SyncResult<()> {
        let Some(stored) = self.store.read_record(Collection::Users, self.uid).await? else {
            debug!(uid = %self.uid, "No user document yet");
            return Ok(());
        };

        let patch = UserPatch::from_document(&stored.data)?;
        self.image = patch.profile_image;
        Ok(())
    }

    /// Remembers `file` for the next upload; no checks yet
    pub fn select_image(&mut self, file: ImageFile) {
        self.pending = Some(file);
    }

    /// File waiting to be uploaded
    pub fn pending(&self) -> Option<&ImageFile> {
        self.pending.as_ref()
    }

    /// Uploads the selected picture
    ///
    /// # Errors
    ///
    /// - `SyncError::SizeLimitExceeded` if the file is over 1 MiB (no request made)
    /// - Any store failure from the merge-write; the display is unchanged
    pub async fn upload(&mut self) -> SyncResult<UploadOutcome> {
        let Some(file) = self.pending.as_ref() else {
            return Ok(UploadOutcome::NothingPending);
        };

        if file.size() > MAX_PROFILE_IMAGE_BYTES {
            self.error_message = Some(SIZE_LIMIT_MESSAGE.to_string());
            return Err(SyncError::SizeLimitExceeded { size: file.size() });
        }
        self.error_message = None;

        let encoded = encode_profile_image(&file.bytes);
        let mut fields = Map::new();
        fields.insert(PROFILE_IMAGE_FIELD.to_string(), Value::String(encoded.clone()));

        if let Err(e) = self.store.merge_record(Collection::Users, self.uid, fields).await {
            warn!(uid = %self.uid, path = %file.path.display(), error = %e, "Profile upload failed");
            return Err(e.into());
        }

        debug!(uid = %self.uid, bytes = file.size(), "Uploaded profile image");
        self.image = Some(encoded);
        Ok(UploadOutcome::Uploaded)
    }

    /// Base64 text of the displayed picture
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Inline error from the last upload attempt
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// What to render in the profile area
    pub fn display(&self) -> ProfileDisplay {
        match &self.image {
            Some(encoded) if !encoded.is_empty() => ProfileDisplay::Image {
                data_uri: format!("data:image/jpeg;base64,{}", encoded),
            },
            _ => ProfileDisplay::Placeholder,
        }
    }
}

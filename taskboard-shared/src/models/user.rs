/// User record stored in the `users` collection
///
/// Each user has exactly one document, keyed by their session identity.
/// Registration writes the identity fields; profile upload merge-writes the
/// `profileImage` field onto the same document.
///
/// # Document Shape
///
/// ```json
/// {
///   "uid": "6f1c1f0e-...",
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "authProvider": "local",
///   "profileImage": "iVBORw0KGgo..."
/// }
/// ```

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::document::{self, Collection, DecodeError, Document};

/// Maximum raw size of a profile image (1 MiB)
pub const MAX_PROFILE_IMAGE_BYTES: usize = 1024 * 1024;

/// Field holding the base64 profile image
pub const PROFILE_IMAGE_FIELD: &str = "profileImage";

/// How the user authenticated when the account was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password
    Local,

    /// Google federated sign-in
    Google,
}

impl AuthProvider {
    /// Gets provider tag as string
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(AuthProvider::Local),
            "google" => Ok(AuthProvider::Google),
            other => Err(format!("Unknown auth provider: {}", other)),
        }
    }
}

/// Typed body of a user document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Session identity (also the document id)
    pub uid: Uuid,

    /// Display name, absent when the provider supplied none
    #[serde(default)]
    pub name: Option<String>,

    /// Email address
    pub email: String,

    /// Provider tag
    pub auth_provider: AuthProvider,

    /// Base64 profile image (raw size at most 1 MiB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl UserRecord {
    /// Creates a user record without a profile image
    pub fn new(uid: Uuid, name: Option<String>, email: impl Into<String>, auth_provider: AuthProvider) -> Self {
        Self {
            uid,
            name,
            email: email.into(),
            auth_provider,
            profile_image: None,
        }
    }

    /// Decodes and validates a user document
    ///
    /// # Errors
    ///
    /// - `DecodeError::Malformed` if identity fields are missing or mistyped
    /// - `DecodeError::Invalid` if the profile image is not base64 or exceeds 1 MiB
    pub fn from_document(document: &Document) -> Result<Self, DecodeError> {
        let record: UserRecord = document::decode(Collection::Users, document)?;

        if let Some(ref image) = record.profile_image {
            validate_profile_image(image)?;
        }

        Ok(record)
    }

    /// Encodes the record as a document body
    pub fn to_document(&self) -> Document {
        document::encode(self)
    }
}

/// Partial user document, as sent by a merge-write
///
/// Every field is optional; fields that are present must have the same type
/// as on [`UserRecord`]. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub uid: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub auth_provider: Option<AuthProvider>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl UserPatch {
    /// Decodes and validates a partial user document
    ///
    /// # Errors
    ///
    /// Same as [`UserRecord::from_document`], for the fields present.
    pub fn from_document(document: &Document) -> Result<Self, DecodeError> {
        let patch: UserPatch = document::decode(Collection::Users, document)?;

        if let Some(ref image) = patch.profile_image {
            validate_profile_image(image)?;
        }

        Ok(patch)
    }
}

/// Encodes raw image bytes for storage
pub fn encode_profile_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Checks that an encoded profile image decodes to at most 1 MiB
///
/// # Errors
///
/// Returns `DecodeError::Invalid` if the text is not standard base64 or the
/// decoded image is larger than [`MAX_PROFILE_IMAGE_BYTES`].
pub fn validate_profile_image(encoded: &str) -> Result<(), DecodeError> {
    let bytes = STANDARD.decode(encoded).map_err(|e| DecodeError::Invalid {
        collection: Collection::Users,
        reason: format!("profileImage is not valid base64: {}", e),
    })?;

    if bytes.len() > MAX_PROFILE_IMAGE_BYTES {
        return Err(DecodeError::Invalid {
            collection: Collection::Users,
            reason: format!(
                "profileImage is {} bytes, limit is {} bytes",
                bytes.len(),
                MAX_PROFILE_IMAGE_BYTES
            ),
        });
    }

    Ok(())
}

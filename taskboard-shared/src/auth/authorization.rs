/// Document ownership rules
///
/// Every document route checks the caller against these rules before
/// touching the store:
///
/// | Collection | Create        | Read / write / merge       | Delete        | Query            |
/// |------------|---------------|----------------------------|---------------|------------------|
/// | `users`    | not allowed   | only `users/{caller}`      | not allowed   | `uid == caller`  |
/// | `tasks`    | `uid == caller` | owner only, `uid == caller` after the change | owner only | `uid == caller` |
///
/// Bodies are also decoded into their typed records here, so a document that
/// passes authorization is known to be well formed.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::{require_create, require_query};
/// use taskboard_shared::auth::middleware::AuthContext;
/// use taskboard_shared::models::document::Collection;
/// use taskboard_shared::models::task::TaskRecord;
/// use serde_json::json;
/// use uuid::Uuid;
///
/// let caller = AuthContext::new(Uuid::new_v4());
/// let task = TaskRecord::new("buy milk", caller.user_id).to_document();
///
/// assert!(require_create(&caller, Collection::Tasks, &task).is_ok());
/// assert!(require_query(&caller, Collection::Tasks, "uid", &json!(caller.user_id)).is_ok());
/// assert!(require_query(&caller, Collection::Tasks, "completed", &json!(true)).is_err());
/// ```

use serde_json::Value;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::document::{merge_fields, Collection, DecodeError, Document};
use crate::models::task::{TaskRecord, OWNER_FIELD};
use crate::models::user::{UserPatch, UserRecord};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller does not own the document
    #[error("Not authorized to access this document")]
    NotOwner,

    /// Operation is never allowed on this collection
    #[error("{0}")]
    NotAllowed(String),

    /// Body does not match the record shape
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Reads the owner of a stored document, if it has a well-formed one
pub fn document_owner(collection: Collection, id: Uuid, document: &Document) -> Option<Uuid> {
    match collection {
        Collection::Users => Some(id),
        Collection::Tasks => document
            .get(OWNER_FIELD)
            .and_then(Value::as_str)
            .and_then(|owner| owner.parse().ok()),
    }
}

/// Checks that `owner` is the caller
pub fn require_ownership(auth: &AuthContext, owner: Uuid) -> Result<(), AuthzError> {
    if owner != auth.user_id {
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

fn require_owned_or_absent(
    auth: &AuthContext,
    collection: Collection,
    id: Uuid,
    existing: Option<&Document>,
) -> Result<(), AuthzError> {
    if collection == Collection::Users {
        return require_ownership(auth, id);
    }

    match existing {
        Some(document) => match document_owner(collection, id, document) {
            Some(owner) => require_ownership(auth, owner),
            None => Err(AuthzError::NotOwner),
        },
        None => Ok(()),
    }
}

fn require_valid_body(
    auth: &AuthContext,
    collection: Collection,
    id: Uuid,
    body: &Document,
) -> Result<(), AuthzError> {
    match collection {
        Collection::Users => {
            let record = UserRecord::from_document(body)?;
            if record.uid != id {
                return Err(AuthzError::NotAllowed(
                    "User document uid must match its id".to_string(),
                ));
            }
            require_ownership(auth, record.uid)
        }
        Collection::Tasks => {
            let record = TaskRecord::from_document(body)?;
            require_ownership(auth, record.uid)
        }
    }
}

/// Checks a create with a store-generated id
pub fn require_create(
    auth: &AuthContext,
    collection: Collection,
    data: &Document,
) -> Result<(), AuthzError> {
    match collection {
        Collection::Users => Err(AuthzError::NotAllowed(
            "User documents are keyed by uid and cannot be created with a generated id".to_string(),
        )),
        Collection::Tasks => {
            let record = TaskRecord::from_document(data)?;
            require_ownership(auth, record.uid)
        }
    }
}

/// Checks a read of an existing document
pub fn require_read(
    auth: &AuthContext,
    collection: Collection,
    id: Uuid,
    existing: &Document,
) -> Result<(), AuthzError> {
    require_owned_or_absent(auth, collection, id, Some(existing))
}

/// Checks a full overwrite
///
/// The caller must own the current document (if any) and the new body.
pub fn require_write(
    auth: &AuthContext,
    collection: Collection,
    id: Uuid,
    existing: Option<&Document>,
    data: &Document,
) -> Result<(), AuthzError> {
    require_owned_or_absent(auth, collection, id, existing)?;
    require_valid_body(auth, collection, id, data)
}

fn require_user_patch(id: Uuid, document: &Document) -> Result<(), AuthzError> {
    let patch = UserPatch::from_document(document)?;
    match patch.uid {
        Some(uid) if uid != id => Err(AuthzError::NotAllowed(
            "User document uid must match its id".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Checks a merge-write
///
/// When the document is a complete record, the merged result must be one
/// too, owned by the caller. A user document that is absent or still partial
/// (e.g. only `profileImage`) only needs the merged fields to be well typed.
pub fn require_merge(
    auth: &AuthContext,
    collection: Collection,
    id: Uuid,
    existing: Option<&Document>,
    fields: &Document,
) -> Result<(), AuthzError> {
    require_owned_or_absent(auth, collection, id, existing)?;

    let mut merged = existing.cloned().unwrap_or_default();
    merge_fields(&mut merged, fields);

    match (collection, existing) {
        (Collection::Users, Some(document)) if UserRecord::from_document(document).is_ok() => {
            require_valid_body(auth, collection, id, &merged)
        }
        (Collection::Users, _) => require_user_patch(id, &merged),
        (Collection::Tasks, _) => require_valid_body(auth, collection, id, &merged),
    }
}

/// Checks a delete
///
/// Deleting an absent task is allowed so deletes stay idempotent.
pub fn require_delete(
    auth: &AuthContext,
    collection: Collection,
    id: Uuid,
    existing: Option<&Document>,
) -> Result<(), AuthzError> {
    match collection {
        Collection::Users => Err(AuthzError::NotAllowed(
            "User documents cannot be deleted".to_string(),
        )),
        Collection::Tasks => require_owned_or_absent(auth, collection, id, existing),
    }
}

/// Checks an equality query
///
/// Only the caller's own documents may be listed: `uid == caller`.
pub fn require_query(
    auth: &AuthContext,
    _collection: Collection,
    field: &str,
    value: &Value,
) -> Result<(), AuthzError> {
    if field != OWNER_FIELD {
        return Err(AuthzError::NotAllowed(format!(
            "Queries must filter on {}",
            OWNER_FIELD
        )));
    }

    let owner = value
        .as_str()
        .and_then(|v| v.parse::<Uuid>().ok())
        .ok_or(AuthzError::NotOwner)?;

    require_ownership(auth, owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{encode_profile_image, AuthProvider, MAX_PROFILE_IMAGE_BYTES};
    use serde_json::json;

    fn caller() -> AuthContext {
        AuthContext::new(Uuid::new_v4())
    }

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn user_doc(uid: Uuid) -> Document {
        UserRecord::new(uid, Some("Ada".to_string()), "ada@example.com", AuthProvider::Local).to_document()
    }

    #[test]
    fn test_create_task_requires_own_uid() {
        let auth = caller();

        let own = TaskRecord::new("mine", auth.user_id).to_document();
        assert!(require_create(&auth, Collection::Tasks, &own).is_ok());

        let other = TaskRecord::new("theirs", Uuid::new_v4()).to_document();
        assert!(matches!(
            require_create(&auth, Collection::Tasks, &other),
            Err(AuthzError::NotOwner)
        ));
    }

    #[test]
    fn test_create_rejects_malformed_and_users() {
        let auth = caller();

        let malformed = doc(json!({"text": "no owner"}));
        assert!(matches!(
            require_create(&auth, Collection::Tasks, &malformed),
            Err(AuthzError::Decode(_))
        ));

        assert!(matches!(
            require_create(&auth, Collection::Users, &user_doc(auth.user_id)),
            Err(AuthzError::NotAllowed(_))
        ));
    }

    #[test]
    fn test_read_rules() {
        let auth = caller();
        let own_task = TaskRecord::new("mine", auth.user_id).to_document();
        let other_task = TaskRecord::new("theirs", Uuid::new_v4()).to_document();

        assert!(require_read(&auth, Collection::Tasks, Uuid::new_v4(), &own_task).is_ok());
        assert!(require_read(&auth, Collection::Tasks, Uuid::new_v4(), &other_task).is_err());

        assert!(require_read(&auth, Collection::Users, auth.user_id, &user_doc(auth.user_id)).is_ok());
        let stranger = Uuid::new_v4();
        assert!(require_read(&auth, Collection::Users, stranger, &user_doc(stranger)).is_err());
    }

    #[test]
    fn test_write_cannot_take_over_a_task() {
        let auth = caller();
        let victim = Uuid::new_v4();
        let existing = TaskRecord::new("theirs", victim).to_document();
        let replacement = TaskRecord::new("mine now", auth.user_id).to_document();

        assert!(matches!(
            require_write(&auth, Collection::Tasks, Uuid::new_v4(), Some(&existing), &replacement),
            Err(AuthzError::NotOwner)
        ));
    }

    #[test]
    fn test_write_cannot_give_away_a_task() {
        let auth = caller();
        let existing = TaskRecord::new("mine", auth.user_id).to_document();
        let replacement = TaskRecord::new("mine", Uuid::new_v4()).to_document();

        assert!(require_write(&auth, Collection::Tasks, Uuid::new_v4(), Some(&existing), &replacement).is_err());
    }

    #[test]
    fn test_write_user_document_must_match_id() {
        let auth = caller();

        assert!(require_write(&auth, Collection::Users, auth.user_id, None, &user_doc(auth.user_id)).is_ok());

        let mismatched = user_doc(Uuid::new_v4());
        assert!(matches!(
            require_write(&auth, Collection::Users, auth.user_id, None, &mismatched),
            Err(AuthzError::NotAllowed(_))
        ));
    }

    #[test]
    fn test_merge_toggle_on_own_task() {
        let auth = caller();
        let existing = TaskRecord::new("mine", auth.user_id).to_document();

        let toggle = doc(json!({"completed": true}));
        assert!(require_merge(&auth, Collection::Tasks, Uuid::new_v4(), Some(&existing), &toggle).is_ok());

        let bad_type = doc(json!({"completed": "yes"}));
        assert!(matches!(
            require_merge(&auth, Collection::Tasks, Uuid::new_v4(), Some(&existing), &bad_type),
            Err(AuthzError::Decode(_))
        ));
    }

    #[test]
    fn test_merge_profile_image() {
        let auth = caller();
        let image = doc(json!({"profileImage": encode_profile_image(b"jpeg bytes")}));

        // Onto an existing user record
        let existing = user_doc(auth.user_id);
        assert!(require_merge(&auth, Collection::Users, auth.user_id, Some(&existing), &image).is_ok());

        // Onto an absent record
        assert!(require_merge(&auth, Collection::Users, auth.user_id, None, &image).is_ok());

        // Onto a partial record left by an earlier merge
        let partial = doc(json!({"profileImage": encode_profile_image(b"old")}));
        assert!(require_merge(&auth, Collection::Users, auth.user_id, Some(&partial), &image).is_ok());

        // Onto someone else's record
        assert!(require_merge(&auth, Collection::Users, Uuid::new_v4(), None, &image).is_err());

        let oversized = doc(json!({
            "profileImage": encode_profile_image(&vec![0u8; MAX_PROFILE_IMAGE_BYTES + 1])
        }));
        assert!(matches!(
            require_merge(&auth, Collection::Users, auth.user_id, None, &oversized),
            Err(AuthzError::Decode(DecodeError::Invalid { .. }))
        ));
    }

    #[test]
    fn test_merge_keeps_complete_user_record_complete() {
        let auth = caller();
        let existing = user_doc(auth.user_id);

        let bad_email = doc(json!({"email": 42}));
        assert!(matches!(
            require_merge(&auth, Collection::Users, auth.user_id, Some(&existing), &bad_email),
            Err(AuthzError::Decode(_))
        ));

        let partial = doc(json!({"name": "Ada"}));
        let wrong_uid = doc(json!({"uid": Uuid::new_v4()}));
        assert!(matches!(
            require_merge(&auth, Collection::Users, auth.user_id, Some(&partial), &wrong_uid),
            Err(AuthzError::NotAllowed(_))
        ));
    }

    #[test]
    fn test_delete_rules() {
        let auth = caller();
        let own = TaskRecord::new("mine", auth.user_id).to_document();
        let other = TaskRecord::new("theirs", Uuid::new_v4()).to_document();

        assert!(require_delete(&auth, Collection::Tasks, Uuid::new_v4(), Some(&own)).is_ok());
        assert!(require_delete(&auth, Collection::Tasks, Uuid::new_v4(), None).is_ok());
        assert!(require_delete(&auth, Collection::Tasks, Uuid::new_v4(), Some(&other)).is_err());
        assert!(require_delete(&auth, Collection::Users, auth.user_id, None).is_err());
    }

    #[test]
    fn test_query_rules() {
        let auth = caller();

        assert!(require_query(&auth, Collection::Tasks, "uid", &json!(auth.user_id)).is_ok());
        assert!(require_query(&auth, Collection::Tasks, "uid", &json!(Uuid::new_v4())).is_err());
        assert!(require_query(&auth, Collection::Tasks, "uid", &json!(42)).is_err());
        assert!(require_query(&auth, Collection::Tasks, "text", &json!("x")).is_err());
    }

    #[test]
    fn test_document_owner() {
        let owner = Uuid::new_v4();
        let task = TaskRecord::new("x", owner).to_document();

        assert_eq!(document_owner(Collection::Tasks, Uuid::new_v4(), &task), Some(owner));
        assert_eq!(document_owner(Collection::Tasks, Uuid::new_v4(), &Document::new()), None);

        let id = Uuid::new_v4();
        assert_eq!(document_owner(Collection::Users, id, &Document::new()), Some(id));
    }
}

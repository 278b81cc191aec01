/// Data models for Taskboard
///
/// # Models
///
/// - `document`: Collections, schemaless document bodies and decode errors
/// - `user`: User record (`users` collection) and profile image limits
/// - `task`: Task record (`tasks` collection)
/// - `account`: Authentication accounts (Postgres `accounts` table)
///
/// # Example
///
/// ```
/// use taskboard_shared::models::task::TaskRecord;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let document = TaskRecord::new("buy milk", owner).to_document();
/// assert_eq!(document["completed"], false);
/// ```

pub mod account;
pub mod document;
pub mod task;
pub mod user;

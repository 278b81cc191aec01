/// Task Sync
///
/// Keeps the local task list (the cache the UI renders) in step with the
/// `tasks` collection for one signed-in user.
///
/// # Operations
///
/// ```text
/// load()                 query uid == owner        -> replace cache
/// add(text)              create {text, false, uid} -> append
/// begin_edit(i)          (local only)              -> input = text, editing = i
/// commit_edit()          write full record at id   -> replace entry
/// remove(i)              delete id                 -> drop entry (always)
/// toggle_completion(i)   write full record at id   -> flip flag
/// filter_view(mode)      (local only)
/// remaining_count()      (local only)
/// ```
///
/// Local state changes only after the store confirms a write; on failure the
/// cache is left as it was and the error is returned. `remove` is the
/// exception: the entry is dropped whatever the delete returned.
///
/// Indices are positions in the local cache. `filter_view` hands them back
/// alongside each task so a filtered view can address the right entry.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_client::tasks::{FilterMode, TaskSync};
/// use taskboard_shared::store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), taskboard_client::error::SyncError> {
/// let mut tasks = TaskSync::new(Arc::new(MemoryStore::new()), Uuid::new_v4());
/// tasks.load().await?;
/// tasks.add("buy milk").await?;
/// tasks.toggle_completion(0).await?;
///
/// assert_eq!(tasks.filter_view(FilterMode::Completed).len(), 1);
/// assert_eq!(tasks.remaining_count(), 0);
/// # Ok(())
/// # }
/// ```

use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use taskboard_shared::models::document::{Collection, StoredDocument};
use taskboard_shared::models::task::{TaskRecord, OWNER_FIELD};
use taskboard_shared::store::DocumentStore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

/// A task in the local cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Store identity
    pub id: Uuid,

    /// Free-text content
    pub text: String,

    /// Completion flag
    pub completed: bool,

    /// Owner's session identity
    pub owner: Uuid,
}

impl Task {
    fn from_stored(stored: &StoredDocument) -> SyncResult<Self> {
        let record = TaskRecord::from_document(&stored.data)?;

        Ok(Self {
            id: stored.id,
            text: record.text,
            completed: record.completed,
            owner: record.uid,
        })
    }

    /// The wire record for this task
    pub fn record(&self) -> TaskRecord {
        TaskRecord {
            text: self.text.clone(),
            completed: self.completed,
            uid: self.owner,
        }
    }
}

/// Which tasks a view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    /// Whether `task` belongs in this view
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !task.completed,
            FilterMode::Completed => task.completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Active => "active",
            FilterMode::Completed => "completed",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FilterMode::All),
            "active" => Ok(FilterMode::Active),
            "completed" => Ok(FilterMode::Completed),
            other => Err(format!("Unknown filter: {}", other)),
        }
    }
}

/// Task list synchronized with the store for one user
pub struct TaskSync {
    store: Arc<dyn DocumentStore>,
    owner: Uuid,
    tasks: Vec<Task>,
    input: String,
    editing: Option<usize>,
}

impl TaskSync {
    /// Creates an empty task list for `owner`
    pub fn new(store: Arc<dyn DocumentStore>, owner: Uuid) -> Self {
        Self {
            store,
            owner,
            tasks: Vec::new(),
            input: String::new(),
            editing: None,
        }
    }

    /// Owner's session identity
    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// The local cache, in list order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Current input field text
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the input field text
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Index of the task being edited, if any
    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    /// Loads the owner's tasks, replacing the local cache
    ///
    /// Tasks come back in store order. A document that does not decode fails
    /// the whole load and leaves the cache untouched.
    pub async fn load(&mut self) -> SyncResult<()> {
        let documents = self
            .store
            .query_records(Collection::Tasks, OWNER_FIELD, &json!(self.owner))
            .await?;

        let mut tasks = Vec::with_capacity(documents.len());
        for stored in &documents {
            let task = Task::from_stored(stored)?;
            if task.owner != self.owner {
                warn!(id = %task.id, "Skipping task owned by another user");
                continue;
            }
            tasks.push(task);
        }

        debug!(owner = %self.owner, count = tasks.len(), "Loaded tasks");
        self.tasks = tasks;
        self.editing = None;
        Ok(())
    }

    /// Creates a task and appends it to the list
    ///
    /// Blank text is a no-op. The input field is cleared once the task is
    /// stored.
    pub async fn add(&mut self, text: &str) -> SyncResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let record = TaskRecord::new(text, self.owner);
        let id = self
            .store
            .create_record(Collection::Tasks, record.to_document())
            .await
            .map_err(|e| write_failed("add", e.into()))?;

        self.tasks.push(Task {
            id,
            text: record.text,
            completed: record.completed,
            owner: self.owner,
        });
        self.input.clear();
        Ok(())
    }

    /// Starts editing the task at `index`
    pub fn begin_edit(&mut self, index: usize) -> SyncResult<()> {
        let task = self.task(index)?;

        self.input = task.text.clone();
        self.editing = Some(index);
        Ok(())
    }

    /// Abandons the edit in progress and clears the input
    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.input.clear();
    }

    /// Saves the input as the new text of the task being edited
    ///
    /// No-op without an edit in progress or with blank input. Identity and
    /// completion flag are kept.
    pub async fn commit_edit(&mut self) -> SyncResult<()> {
        let Some(index) = self.editing else {
            return Ok(());
        };
        if self.input.trim().is_empty() {
            return Ok(());
        }

        let mut updated = self.task(index)?.clone();
        updated.text = self.input.clone();

        self.store
            .write_record(Collection::Tasks, updated.id, updated.record().to_document())
            .await
            .map_err(|e| write_failed("edit", e.into()))?;

        self.tasks[index] = updated;
        self.editing = None;
        self.input.clear();
        Ok(())
    }

    /// Commits the edit in progress, or adds the input as a new task
    pub async fn submit(&mut self) -> SyncResult<()> {
        if self.editing.is_some() {
            self.commit_edit().await
        } else {
            let text = self.input.clone();
            self.add(&text).await
        }
    }

    /// Deletes the task at `index`
    ///
    /// The entry leaves the local list even if the delete fails; the error
    /// is still returned.
    pub async fn remove(&mut self, index: usize) -> SyncResult<()> {
        let id = self.task(index)?.id;

        let result = self.store.delete_record(Collection::Tasks, id).await;

        self.tasks.remove(index);
        self.editing = match self.editing {
            Some(editing) if editing == index => {
                self.input.clear();
                None
            }
            Some(editing) if editing > index => Some(editing - 1),
            other => other,
        };

        result.map_err(|e| write_failed("remove", e.into()))
    }

    /// Flips the completion flag of the task at `index`
    pub async fn toggle_completion(&mut self, index: usize) -> SyncResult<()> {
        let mut updated = self.task(index)?.clone();
        updated.completed = !updated.completed;

        self.store
            .write_record(Collection::Tasks, updated.id, updated.record().to_document())
            .await
            .map_err(|e| write_failed("toggle", e.into()))?;

        self.tasks[index] = updated;
        Ok(())
    }

    /// Tasks shown under `mode`, paired with their list index
    pub fn filter_view(&self, mode: FilterMode) -> Vec<(usize, &Task)> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| mode.matches(task))
            .collect()
    }

    /// Number of tasks not yet completed
    pub fn remaining_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    fn task(&self, index: usize) -> SyncResult<&Task> {
        self.tasks.get(index).ok_or(SyncError::IndexOutOfRange {
            index,
            len: self.tasks.len(),
        })
    }
}

fn write_failed(operation: &str, err: SyncError) -> SyncError {
    warn!(operation, error = %err, "Task write failed");
    err
}

/// Dashboard controller
///
/// Composes the Session Gate, Task Sync and Profile Sync the way the task
/// page uses them:
///
/// ```text
/// auth state ──▶ SessionGate ──Authenticated(user)──▶ TaskSync::load
///                    │                               ProfileSync::load
///                    └──Unauthenticated──▶ drop user data, redirect
///
/// UI action ──▶ Dashboard ──▶ TaskSync / ProfileSync ──▶ store
///                   │
///                   └── failure ──▶ Notifier::toast
/// ```
///
/// Size-limit failures are not toasted; they show inline through
/// [`ProfileSync::error_message`]. If loading the user's data fails, nothing
/// is kept and the next [`poll_session`](Dashboard::poll_session) or
/// [`start`](Dashboard::start) loads again.

use std::sync::Arc;
use taskboard_shared::store::{AuthService, AuthUser, DocumentStore};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::notify::Notifier;
use crate::profile::{ImageFile, ProfileSync, UploadOutcome};
use crate::session::{Navigator, SessionGate, SessionState};
use crate::tasks::{FilterMode, Task, TaskSync};

/// Data loaded for the signed-in user
struct ActiveSession {
    user: AuthUser,
    tasks: TaskSync,
    profile: ProfileSync,
}

/// Task page controller
pub struct Dashboard {
    gate: SessionGate,
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    filter: FilterMode,
    session: Option<ActiveSession>,
}

impl Dashboard {
    pub fn new(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let gate = SessionGate::new(auth.observe_auth_state(), navigator);

        Self {
            gate,
            auth,
            store,
            notifier,
            filter: FilterMode::All,
            session: None,
        }
    }

    /// Waits for the session to resolve and loads the user's data
    ///
    /// Returns the signed-in user, or `None` if nobody is signed in.
    pub async fn start(&mut self) -> SyncResult<Option<AuthUser>> {
        self.gate.wait_until_resolved().await;
        self.sync_session().await?;
        Ok(self.user().cloned())
    }

    /// Waits for the next auth-state change and follows it
    ///
    /// Returns `None` once the auth service has gone away.
    pub async fn next_change(&mut self) -> Option<SyncResult<()>> {
        self.gate.changed().await?;
        Some(self.sync_session().await)
    }

    /// Follows an auth-state change that was already published, if any
    pub async fn poll_session(&mut self) -> SyncResult<()> {
        self.gate.poll();
        self.sync_session().await
    }

    /// Gate state
    pub fn state(&self) -> &SessionState {
        self.gate.state()
    }

    /// Signed-in user whose data is loaded
    pub fn user(&self) -> Option<&AuthUser> {
        self.session.as_ref().map(|session| &session.user)
    }

    /// Task list, when signed in
    pub fn tasks(&self) -> Option<&TaskSync> {
        self.session.as_ref().map(|session| &session.tasks)
    }

    /// Profile picture state, when signed in
    pub fn profile(&self) -> Option<&ProfileSync> {
        self.session.as_ref().map(|session| &session.profile)
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
    }

    /// Tasks under the current filter, with their list indices
    pub fn visible_tasks(&self) -> Vec<(usize, &Task)> {
        self.tasks()
            .map(|tasks| tasks.filter_view(self.filter))
            .unwrap_or_default()
    }

    /// Footer text, e.g. "3 tasks remaining"
    pub fn remaining_label(&self) -> String {
        let remaining = self.tasks().map(TaskSync::remaining_count).unwrap_or(0);
        format!("{} tasks remaining", remaining)
    }

    pub fn set_input(&mut self, text: impl Into<String>) -> SyncResult<()> {
        self.active()?.tasks.set_input(text);
        Ok(())
    }

    /// Adds `text` as a new task, leaving any edit in progress alone
    pub async fn add(&mut self, text: &str) -> SyncResult<()> {
        let session = self.session.as_mut().ok_or(SyncError::NoSession)?;
        let draft = session.tasks.input().to_string();
        let result = session.tasks.add(text).await;
        if session.tasks.editing().is_some() {
            session.tasks.set_input(draft);
        }
        surface(self.notifier.as_ref(), result)
    }

    /// Add/Update button
    pub async fn submit(&mut self) -> SyncResult<()> {
        let session = self.session.as_mut().ok_or(SyncError::NoSession)?;
        let result = session.tasks.submit().await;
        surface(self.notifier.as_ref(), result)
    }

    pub fn begin_edit(&mut self, index: usize) -> SyncResult<()> {
        let session = self.session.as_mut().ok_or(SyncError::NoSession)?;
        let result = session.tasks.begin_edit(index);
        surface(self.notifier.as_ref(), result)
    }

    pub fn cancel_edit(&mut self) -> SyncResult<()> {
        self.active()?.tasks.cancel_edit();
        Ok(())
    }

    pub async fn toggle_completion(&mut self, index: usize) -> SyncResult<()> {
        let session = self.session.as_mut().ok_or(SyncError::NoSession)?;
        let result = session.tasks.toggle_completion(index).await;
        surface(self.notifier.as_ref(), result)
    }

    pub async fn remove(&mut self, index: usize) -> SyncResult<()> {
        let session = self.session.as_mut().ok_or(SyncError::NoSession)?;
        let result = session.tasks.remove(index).await;
        surface(self.notifier.as_ref(), result)
    }

    pub fn select_image(&mut self, file: ImageFile) -> SyncResult<()> {
        self.active()?.profile.select_image(file);
        Ok(())
    }

    /// Upload Picture button
    pub async fn upload_profile_image(&mut self) -> SyncResult<UploadOutcome> {
        let session = self.session.as_mut().ok_or(SyncError::NoSession)?;
        let result = session.profile.upload().await;
        surface(self.notifier.as_ref(), result)
    }

    /// Logout button
    ///
    /// The gate sees the sign-out on the next [`next_change`](Self::next_change).
    pub async fn sign_out(&mut self) -> SyncResult<()> {
        self.auth.sign_out().await?;
        Ok(())
    }

    fn active(&mut self) -> SyncResult<&mut ActiveSession> {
        self.session.as_mut().ok_or(SyncError::NoSession)
    }

    async fn sync_session(&mut self) -> SyncResult<()> {
        let user = match self.gate.state() {
            SessionState::Authenticated(user) => user.clone(),
            SessionState::Loading | SessionState::Unauthenticated => {
                if let Some(ended) = self.session.take() {
                    info!(uid = %ended.user.uid, "Session ended, cleared user data");
                }
                return Ok(());
            }
        };

        if self.user().map(|current| current.uid) == Some(user.uid) {
            return Ok(());
        }

        debug!(uid = %user.uid, "Loading user data");
        self.session = None;

        let mut session = ActiveSession {
            tasks: TaskSync::new(self.store.clone(), user.uid),
            profile: ProfileSync::new(self.store.clone(), user.uid),
            user,
        };

        let tasks = session.tasks.load().await;
        let profile = session.profile.load().await;

        // Only a fully loaded session is kept; the next sync retries otherwise
        if tasks.is_ok() && profile.is_ok() {
            self.session = Some(session);
        }

        surface(self.notifier.as_ref(), tasks.and(profile))
    }
}

fn surface<T>(notifier: &dyn Notifier, result: SyncResult<T>) -> SyncResult<T> {
    if let Err(ref err) = result {
        if !matches!(err, SyncError::SizeLimitExceeded { .. }) {
            notifier.toast(&err.to_string());
        }
    }
    result
}

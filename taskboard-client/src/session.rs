/// Session Gate
///
/// Follows the auth-state observer and keeps the UI out of user-scoped views
/// while nobody is signed in.
///
/// ```text
///                 SignedIn(user)
///   Loading ─────────────────────▶ Authenticated(user)
///      │                             │        ▲
///      │ SignedOut                   │        │ SignedIn(user)
///      ▼                             ▼        │
///   Unauthenticated ◀────────────────┘────────┘
///      (redirect to entry page on every entry)
/// ```
///
/// Transitions come only from the observed [`AuthState`]. The gate never
/// changes state on its own. Creating a gate subscribes it; dropping it (or
/// calling [`SessionGate::close`]) unsubscribes.
///
/// The observer is a `watch` channel, so a gate that is not polled for a
/// while only sees the latest state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskboard_shared::store::{AuthState, AuthUser};
use tokio::sync::watch;
use tracing::debug;

/// Where the gate sends unauthenticated users
pub trait Navigator: Send + Sync {
    /// Navigates to the entry (sign-in) page
    fn redirect_to_entry(&self);
}

/// Navigator that counts redirects
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of redirects so far
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_entry(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Gate state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Session persistence not checked yet
    Loading,

    /// A user is signed in
    Authenticated(AuthUser),

    /// Nobody is signed in
    Unauthenticated,
}

impl From<&AuthState> for SessionState {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Loading => SessionState::Loading,
            AuthState::SignedIn(user) => SessionState::Authenticated(user.clone()),
            AuthState::SignedOut => SessionState::Unauthenticated,
        }
    }
}

/// Auth-state driven session gate
pub struct SessionGate {
    rx: watch::Receiver<AuthState>,
    navigator: Arc<dyn Navigator>,
    state: SessionState,
}

impl SessionGate {
    /// Subscribes a gate to `rx` and applies the current auth state
    ///
    /// If nobody is signed in already, this redirects immediately.
    pub fn new(mut rx: watch::Receiver<AuthState>, navigator: Arc<dyn Navigator>) -> Self {
        let initial = rx.borrow_and_update().clone();

        let mut gate = Self {
            rx,
            navigator,
            state: SessionState::Loading,
        };
        gate.apply(&initial);
        gate
    }

    /// Current gate state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Signed-in user, if any
    pub fn user(&self) -> Option<&AuthUser> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Applies the latest auth state without waiting
    pub fn poll(&mut self) -> &SessionState {
        if self.rx.has_changed().unwrap_or(false) {
            let latest = self.rx.borrow_and_update().clone();
            self.apply(&latest);
        }
        &self.state
    }

    /// Waits for the next auth-state change and applies it
    ///
    /// Returns `None` once the auth service has gone away.
    pub async fn changed(&mut self) -> Option<&SessionState> {
        self.rx.changed().await.ok()?;

        let latest = self.rx.borrow_and_update().clone();
        self.apply(&latest);
        Some(&self.state)
    }

    /// Waits until the state is no longer `Loading`
    ///
    /// Returns `None` if the auth service goes away first.
    pub async fn wait_until_resolved(&mut self) -> Option<&SessionState> {
        while self.state == SessionState::Loading {
            self.changed().await?;
        }
        Some(&self.state)
    }

    /// Unsubscribes from auth-state changes
    pub fn close(self) {}

    fn apply(&mut self, auth: &AuthState) {
        let next = SessionState::from(auth);

        if next == SessionState::Unauthenticated && self.state != SessionState::Unauthenticated {
            debug!("Session ended, redirecting to entry page");
            self.navigator.redirect_to_entry();
        }

        self.state = next;
    }
}

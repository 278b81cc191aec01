/// Authentication service contract
///
/// Auth state is published on a `tokio::sync::watch` channel. Observers
/// subscribe with [`AuthService::observe_auth_state`] and unsubscribe by
/// dropping the receiver.
///
/// ```text
///             sign_in_* / register / restore
///   Loading ─────────────────────────────────▶ SignedIn(user)
///      │                                         │
///      │ no stored session                       │ sign_out / expiry
///      ▼                                         ▼
///   SignedOut ◀──────────────────────────────────┘
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use super::StoreResult;
use crate::models::user::AuthProvider;

/// The authenticated user as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Session identity
    pub uid: Uuid,

    /// Email address
    pub email: String,

    /// Display name, if known
    pub name: Option<String>,

    /// Provider the account signs in with
    pub auth_provider: AuthProvider,
}

/// Observable authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Session persistence has not been checked yet
    Loading,

    /// A user is signed in
    SignedIn(AuthUser),

    /// Nobody is signed in
    SignedOut,
}

impl AuthState {
    /// Gets the signed-in user, if any
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// Credential obtained from a federated identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredential {
    /// Which provider issued the token
    pub provider: AuthProvider,

    /// Provider-signed ID token
    pub id_token: String,
}

impl ProviderCredential {
    /// Creates a Google credential
    pub fn google(id_token: impl Into<String>) -> Self {
        Self {
            provider: AuthProvider::Google,
            id_token: id_token.into(),
        }
    }
}

/// Authentication service
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Signs in with a federated provider credential
    async fn sign_in_with_provider(&self, credential: ProviderCredential) -> StoreResult<AuthUser>;

    /// Signs in with email and password
    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<AuthUser>;

    /// Creates a password account and signs it in
    async fn register_with_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> StoreResult<AuthUser>;

    /// Requests a password reset link for `email`
    async fn send_password_reset(&self, email: &str) -> StoreResult<()>;

    /// Ends the current session
    async fn sign_out(&self) -> StoreResult<()>;

    /// Subscribes to auth state changes
    fn observe_auth_state(&self) -> watch::Receiver<AuthState>;

    /// Gets the signed-in user, if any
    fn current_user(&self) -> Option<AuthUser> {
        self.observe_auth_state().borrow().user().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_state_user() {
        let user = AuthUser {
            uid: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            name: None,
            auth_provider: AuthProvider::Local,
        };

        assert_eq!(AuthState::SignedIn(user.clone()).user(), Some(&user));
        assert!(AuthState::Loading.user().is_none());
        assert!(AuthState::SignedOut.user().is_none());
    }

    #[test]
    fn test_google_credential() {
        let credential = ProviderCredential::google("token");
        assert_eq!(credential.provider, AuthProvider::Google);
        assert_eq!(credential.id_token, "token");
    }
}

/// Account flows
///
/// Wraps the auth service calls the entry page makes. Failures are logged
/// and shown through [`Notifier::alert`], then returned; nothing is retried
/// and a failed sign-in leaves the user signed out.
///
/// Every user has exactly one `users/{uid}` document:
///
/// - `register` writes it right after the account is created
/// - `sign_in_with_provider` and `sign_in_with_password` write it when it is
///   missing or incomplete, keeping any stored profile image

use std::sync::Arc;
use taskboard_shared::models::document::Collection;
use taskboard_shared::models::user::{UserPatch, UserRecord};
use taskboard_shared::store::{AuthService, AuthUser, DocumentStore, ProviderCredential};
use tracing::{error, info};

use crate::error::{SyncError, SyncResult};
use crate::notify::Notifier;

/// Alert shown after a reset link was requested
pub const RESET_SENT_MESSAGE: &str = "Password reset link sent!";

/// Sign-in, registration and password reset
pub struct Accounts {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
}

impl Accounts {
    pub fn new(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            auth,
            store,
            notifier,
        }
    }

    /// Signs in with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> SyncResult<AuthUser> {
        let user = self
            .auth
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| self.report("sign in", e.into()))?;

        self.ensure_user_record(&user, "sign in").await?;

        info!(uid = %user.uid, "User signed in");
        Ok(user)
    }

    /// Creates a password account and its user document
    pub async fn register(&self, name: &str, email: &str, password: &str) -> SyncResult<AuthUser> {
        let user = self
            .auth
            .register_with_password(name, email, password)
            .await
            .map_err(|e| self.report("register", e.into()))?;

        let record = UserRecord::new(user.uid, Some(name.to_string()), user.email.clone(), user.auth_provider);
        self.store
            .write_record(Collection::Users, user.uid, record.to_document())
            .await
            .map_err(|e| self.report("register", e.into()))?;

        Ok(user)
    }

    /// Signs in with a provider credential, creating the user document once
    pub async fn sign_in_with_provider(&self, credential: ProviderCredential) -> SyncResult<AuthUser> {
        let user = self
            .auth
            .sign_in_with_provider(credential)
            .await
            .map_err(|e| self.report("provider sign in", e.into()))?;

        self.ensure_user_record(&user, "provider sign in").await?;
        Ok(user)
    }

    /// Requests a password reset link
    pub async fn send_password_reset(&self, email: &str) -> SyncResult<()> {
        self.auth
            .send_password_reset(email)
            .await
            .map_err(|e| self.report("password reset", e.into()))?;

        self.notifier.alert(RESET_SENT_MESSAGE);
        Ok(())
    }

    /// Ends the session
    pub async fn sign_out(&self) -> SyncResult<()> {
        self.auth.sign_out().await?;
        Ok(())
    }

    /// Writes `users/{uid}` unless a complete record is already stored
    async fn ensure_user_record(&self, user: &AuthUser, operation: &str) -> SyncResult<()> {
        let existing = self
            .store
            .read_record(Collection::Users, user.uid)
            .await
            .map_err(|e| self.report(operation, e.into()))?;

        let profile_image = match existing {
            Some(stored) if UserRecord::from_document(&stored.data).is_ok() => return Ok(()),
            Some(stored) => UserPatch::from_document(&stored.data)
                .ok()
                .and_then(|patch| patch.profile_image),
            None => None,
        };

        let mut record = UserRecord::new(user.uid, user.name.clone(), user.email.clone(), user.auth_provider);
        record.profile_image = profile_image;

        self.store
            .write_record(Collection::Users, user.uid, record.to_document())
            .await
            .map_err(|e| self.report(operation, e.into()))?;

        info!(uid = %user.uid, "Wrote user document");
        Ok(())
    }

    fn report(&self, operation: &str, err: SyncError) -> SyncError {
        error!(operation, error = %err, "Account operation failed");
        self.notifier.alert(&err.to_string());
        err
    }
}

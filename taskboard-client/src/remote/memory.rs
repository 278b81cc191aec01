/// In-process Remote Store Client
///
/// Accounts, sessions and documents all live in memory. Document calls go
/// through the same ownership rules as the hosted API, checked against the
/// signed-in user, so sync code sees the same failures it would see online.
///
/// Passwords are hashed with Argon2id. Provider sign-in verifies ID tokens
/// with the secret given to [`MemoryRemote::with_provider_secret`]; without
/// one, provider sign-in is refused.
///
/// # Example
///
/// ```
/// use taskboard_client::remote::MemoryRemote;
/// use taskboard_shared::store::{AuthService, AuthState};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let remote = MemoryRemote::new();
/// let user = remote.register_with_password("Ada", "ada@example.com", "secret1").await?;
///
/// assert_eq!(*remote.observe_auth_state().borrow(), AuthState::SignedIn(user));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use taskboard_shared::auth::authorization;
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::auth::{password, provider};
use taskboard_shared::models::document::{Collection, Document, StoredDocument};
use taskboard_shared::models::user::AuthProvider;
use taskboard_shared::store::{
    AuthService, AuthState, AuthUser, DocumentStore, MemoryStore, ProviderCredential, StoreError,
    StoreResult,
};
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidateEmail;

#[derive(Debug, Clone)]
struct MemoryAccount {
    user: AuthUser,
    password_hash: Option<String>,
}

/// In-memory accounts and documents
pub struct MemoryRemote {
    documents: MemoryStore,
    accounts: RwLock<HashMap<String, MemoryAccount>>,
    provider_secret: Option<String>,
    reset_requests: Mutex<Vec<String>>,
    auth_tx: watch::Sender<AuthState>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Creates an empty remote with nobody signed in
    pub fn new() -> Self {
        let (auth_tx, _) = watch::channel(AuthState::SignedOut);

        Self {
            documents: MemoryStore::new(),
            accounts: RwLock::new(HashMap::new()),
            provider_secret: None,
            reset_requests: Mutex::new(Vec::new()),
            auth_tx,
        }
    }

    /// Enables provider sign-in with ID tokens signed by `secret`
    pub fn with_provider_secret(mut self, secret: impl Into<String>) -> Self {
        self.provider_secret = Some(secret.into());
        self
    }

    /// Underlying document store, without ownership checks
    ///
    /// Use it to seed data or to inject write failures.
    pub fn documents(&self) -> &MemoryStore {
        &self.documents
    }

    /// Emails for which a reset link was sent, oldest first
    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn caller(&self) -> StoreResult<AuthContext> {
        self.auth_tx
            .borrow()
            .user()
            .map(|user| AuthContext::new(user.uid))
            .ok_or_else(|| StoreError::Unauthorized("Not signed in".to_string()))
    }

    async fn existing(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Document>> {
        Ok(self
            .documents
            .read_record(collection, id)
            .await?
            .map(|stored| stored.data))
    }

    fn sign_in(&self, user: AuthUser) -> AuthUser {
        info!(uid = %user.uid, provider = %user.auth_provider, "Signed in");
        self.auth_tx.send_replace(AuthState::SignedIn(user.clone()));
        user
    }

    async fn insert_account(
        &self,
        email: &str,
        name: Option<String>,
        auth_provider: AuthProvider,
        password_hash: Option<String>,
    ) -> StoreResult<AuthUser> {
        let mut accounts = self.accounts.write().await;
        let key = email.to_lowercase();

        if accounts.contains_key(&key) {
            return Err(StoreError::AuthFailure("Email already registered".to_string()));
        }

        let user = AuthUser {
            uid: Uuid::new_v4(),
            email: email.to_string(),
            name,
            auth_provider,
        };
        accounts.insert(
            key,
            MemoryAccount {
                user: user.clone(),
                password_hash,
            },
        );

        Ok(user)
    }

    async fn find_account(&self, email: &str) -> Option<MemoryAccount> {
        self.accounts.read().await.get(&email.to_lowercase()).cloned()
    }
}

fn check_email(email: &str) -> StoreResult<()> {
    if !email.to_string().validate_email() {
        return Err(StoreError::Rejected("Invalid email format".to_string()));
    }
    Ok(())
}

fn invalid_credentials() -> StoreError {
    StoreError::AuthFailure("Invalid email or password".to_string())
}

#[async_trait]
impl DocumentStore for MemoryRemote {
    async fn create_record(&self, collection: Collection, data: Document) -> StoreResult<Uuid> {
        let caller = self.caller()?;
        authorization::require_create(&caller, collection, &data)?;

        self.documents.create_record(collection, data).await
    }

    async fn read_record(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> StoreResult<Option<StoredDocument>> {
        let caller = self.caller()?;

        let Some(stored) = self.documents.read_record(collection, id).await? else {
            return Ok(None);
        };
        authorization::require_read(&caller, collection, id, &stored.data)?;

        Ok(Some(stored))
    }

    async fn write_record(&self, collection: Collection, id: Uuid, data: Document) -> StoreResult<()> {
        let caller = self.caller()?;
        let current = self.existing(collection, id).await?;
        authorization::require_write(&caller, collection, id, current.as_ref(), &data)?;

        self.documents.write_record(collection, id, data).await
    }

    async fn merge_record(&self, collection: Collection, id: Uuid, fields: Document) -> StoreResult<()> {
        let caller = self.caller()?;
        let current = self.existing(collection, id).await?;
        authorization::require_merge(&caller, collection, id, current.as_ref(), &fields)?;

        self.documents.merge_record(collection, id, fields).await
    }

    async fn delete_record(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        let caller = self.caller()?;
        let current = self.existing(collection, id).await?;
        authorization::require_delete(&caller, collection, id, current.as_ref())?;

        self.documents.delete_record(collection, id).await
    }

    async fn query_records(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<StoredDocument>> {
        let caller = self.caller()?;
        authorization::require_query(&caller, collection, field, value)?;

        self.documents.query_records(collection, field, value).await
    }
}

#[async_trait]
impl AuthService for MemoryRemote {
    async fn sign_in_with_provider(&self, credential: ProviderCredential) -> StoreResult<AuthUser> {
        let secret = match credential.provider {
            AuthProvider::Local => {
                return Err(StoreError::AuthFailure(
                    "local is not a federated provider".to_string(),
                ))
            }
            AuthProvider::Google => self.provider_secret.as_deref().ok_or_else(|| {
                StoreError::AuthFailure("google sign-in is not configured".to_string())
            })?,
        };

        let claims = provider::verify_id_token(credential.provider, &credential.id_token, secret)
            .map_err(|e| StoreError::AuthFailure(e.to_string()))?;

        let user = match self.find_account(&claims.email).await {
            Some(account) => account.user,
            None => {
                self.insert_account(&claims.email, claims.name, credential.provider, None)
                    .await?
            }
        };

        Ok(self.sign_in(user))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<AuthUser> {
        let account = self
            .find_account(email.trim())
            .await
            .ok_or_else(invalid_credentials)?;

        let hash = account.password_hash.as_deref().ok_or_else(|| {
            StoreError::AuthFailure(format!(
                "This account signs in with {}",
                account.user.auth_provider
            ))
        })?;

        let verified = password::verify_password(password, hash)
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if !verified {
            warn!(uid = %account.user.uid, "Rejected login with wrong password");
            return Err(invalid_credentials());
        }

        Ok(self.sign_in(account.user))
    }

    async fn register_with_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> StoreResult<AuthUser> {
        let email = email.trim();
        check_email(email).map_err(|_| StoreError::AuthFailure("Invalid email format".to_string()))?;
        password::validate_password_strength(password).map_err(StoreError::AuthFailure)?;

        let hash = password::hash_password(password).map_err(|e| StoreError::Internal(e.to_string()))?;
        let user = self
            .insert_account(email, Some(name.trim().to_string()), AuthProvider::Local, Some(hash))
            .await?;

        Ok(self.sign_in(user))
    }

    async fn send_password_reset(&self, email: &str) -> StoreResult<()> {
        let email = email.trim();
        check_email(email)?;

        if let Some(account) = self.find_account(email).await {
            if account.password_hash.is_some() {
                if let Ok(mut requests) = self.reset_requests.lock() {
                    requests.push(account.user.email.clone());
                }
                info!(uid = %account.user.uid, "Sent password reset link");
            }
        }

        Ok(())
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.auth_tx.send_replace(AuthState::SignedOut);
        Ok(())
    }

    fn observe_auth_state(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskboard_shared::auth::provider::{issue_id_token, ProviderClaims};
    use taskboard_shared::models::task::TaskRecord;

    const SECRET: &str = "memory-provider-secret";

    fn google_token(email: &str, name: Option<&str>) -> ProviderCredential {
        let claims = ProviderClaims::new(AuthProvider::Google, "subject", email, name.map(String::from));
        ProviderCredential::google(issue_id_token(&claims, SECRET).unwrap())
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let remote = MemoryRemote::new();
        let mut rx = remote.observe_auth_state();

        let user = remote
            .register_with_password("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::SignedIn(user.clone()));
        assert_eq!(user.auth_provider, AuthProvider::Local);
        assert_eq!(remote.current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_case_insensitively() {
        let remote = MemoryRemote::new();
        remote
            .register_with_password("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();

        let err = remote
            .register_with_password("Ada", "ADA@example.com", "secret1")
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AuthFailure(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_and_bad_email() {
        let remote = MemoryRemote::new();

        assert!(matches!(
            remote.register_with_password("Ada", "ada@example.com", "12345").await,
            Err(StoreError::AuthFailure(_))
        ));
        assert!(matches!(
            remote.register_with_password("Ada", "not-an-email", "secret1").await,
            Err(StoreError::AuthFailure(_))
        ));
        assert_eq!(*remote.observe_auth_state().borrow(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_password_sign_in() {
        let remote = MemoryRemote::new();
        let registered = remote
            .register_with_password("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();
        remote.sign_out().await.unwrap();

        assert!(matches!(
            remote.sign_in_with_password("ada@example.com", "wrong!").await,
            Err(StoreError::AuthFailure(msg)) if msg == "Invalid email or password"
        ));
        assert!(remote.current_user().is_none());

        let user = remote
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(user.uid, registered.uid);
    }

    #[tokio::test]
    async fn test_provider_sign_in_reuses_account() {
        let remote = MemoryRemote::new().with_provider_secret(SECRET);

        let first = remote
            .sign_in_with_provider(google_token("grace@example.com", Some("Grace")))
            .await
            .unwrap();
        let second = remote
            .sign_in_with_provider(google_token("grace@example.com", Some("Grace")))
            .await
            .unwrap();

        assert_eq!(first.uid, second.uid);
        assert_eq!(first.auth_provider, AuthProvider::Google);
        assert_eq!(first.name.as_deref(), Some("Grace"));

        assert!(matches!(
            remote.sign_in_with_password("grace@example.com", "anything").await,
            Err(StoreError::AuthFailure(msg)) if msg == "This account signs in with google"
        ));
    }

    #[tokio::test]
    async fn test_provider_sign_in_needs_secret() {
        let remote = MemoryRemote::new();

        let result = remote
            .sign_in_with_provider(google_token("grace@example.com", None))
            .await;

        assert!(matches!(result, Err(StoreError::AuthFailure(_))));
    }

    #[tokio::test]
    async fn test_password_reset_records_known_accounts_only() {
        let remote = MemoryRemote::new();
        remote
            .register_with_password("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();

        remote.send_password_reset("ada@example.com").await.unwrap();
        remote.send_password_reset("nobody@example.com").await.unwrap();

        assert_eq!(remote.reset_requests(), vec!["ada@example.com"]);
        assert!(matches!(
            remote.send_password_reset("nope").await,
            Err(StoreError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_documents_require_session() {
        let remote = MemoryRemote::new();

        let result = remote
            .query_records(Collection::Tasks, "uid", &json!(Uuid::new_v4()))
            .await;

        assert!(matches!(result, Err(StoreError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_documents_enforce_ownership() {
        let remote = MemoryRemote::new();
        let stranger = Uuid::new_v4();
        let foreign = remote
            .documents()
            .create_record(Collection::Tasks, TaskRecord::new("not yours", stranger).to_document())
            .await
            .unwrap();

        let user = remote
            .register_with_password("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();

        assert!(matches!(
            remote.read_record(Collection::Tasks, foreign).await,
            Err(StoreError::Forbidden(_))
        ));
        assert!(matches!(
            remote
                .create_record(Collection::Tasks, TaskRecord::new("spoof", stranger).to_document())
                .await,
            Err(StoreError::Forbidden(_))
        ));

        let own = remote
            .create_record(Collection::Tasks, TaskRecord::new("mine", user.uid).to_document())
            .await
            .unwrap();
        let mine = remote
            .query_records(Collection::Tasks, "uid", &json!(user.uid))
            .await
            .unwrap();

        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, own);
    }

    #[tokio::test]
    async fn test_malformed_document_is_a_decode_error() {
        let remote = MemoryRemote::new();
        let user = remote
            .register_with_password("Ada", "ada@example.com", "secret1")
            .await
            .unwrap();

        let body = json!({ "text": 42, "completed": false, "uid": user.uid });
        let result = remote
            .create_record(Collection::Tasks, body.as_object().unwrap().clone())
            .await;

        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}

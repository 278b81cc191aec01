/// HTTP client for the hosted Taskboard API
///
/// Holds the session returned by the last successful sign-in and attaches
/// its access token to every document request. Auth state changes are
/// published on a `watch` channel.
///
/// # Session persistence
///
/// [`HttpRemote::refresh_token`] exposes the refresh token so the caller can
/// keep it between runs; [`HttpRemote::restore_session`] turns it back into
/// a signed-in session (or settles on signed-out).
///
/// # Expiry
///
/// A `401` on a document call ends the session and publishes `SignedOut`.
/// Call [`HttpRemote::refresh_if_expiring`] before the access token runs out
/// to rotate the token pair instead.
///
/// # Example
///
/// ```no_run
/// use taskboard_client::remote::HttpRemote;
/// use taskboard_shared::store::AuthService;
/// use std::time::{Duration, Instant};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let remote = HttpRemote::new("http://localhost:8080", Duration::from_secs(30))?;
/// let user = remote.sign_in_with_password("ada@example.com", "secret1").await?;
/// println!("Signed in as {}", user.email);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use taskboard_shared::models::document::{Collection, DecodeError, Document, StoredDocument};
use taskboard_shared::store::{
    AuthService, AuthState, AuthUser, DocumentStore, ProviderCredential, StoreError, StoreResult,
};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;

/// Session tokens as returned by the auth endpoints
#[derive(Debug, Clone, Deserialize)]
struct AuthResponse {
    user: AuthUser,
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct Session {
    user: AuthUser,
    access_token: String,
    refresh_token: String,
    expires_at: Instant,
}

/// Error body rendered by the API
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct Registration<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Remote store and auth service backed by the Taskboard API
pub struct HttpRemote {
    client: Client,
    base_url: String,
    session: RwLock<Option<Session>>,
    auth_tx: watch::Sender<AuthState>,
}

impl HttpRemote {
    /// Creates a client for the API at `base_url`
    ///
    /// Auth state starts as `Loading` until a sign-in or
    /// [`restore_session`](Self::restore_session) settles it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let (auth_tx, _) = watch::channel(AuthState::Loading);

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: RwLock::new(None),
            auth_tx,
        })
    }

    /// Creates a client from loaded configuration
    pub fn from_config(config: &ClientConfig) -> StoreResult<Self> {
        Self::new(config.api_url.clone(), config.request_timeout())
    }

    /// Refresh token of the current session, for persisting between runs
    pub async fn refresh_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.refresh_token.clone())
    }

    /// Resumes a persisted session
    ///
    /// With no token, or a token the API no longer accepts, the auth state
    /// settles on `SignedOut` and `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Network` if the API cannot be reached; the auth
    /// state is still settled on `SignedOut`.
    pub async fn restore_session(&self, refresh_token: Option<&str>) -> StoreResult<Option<AuthUser>> {
        let Some(token) = refresh_token else {
            self.publish(AuthState::SignedOut);
            return Ok(None);
        };

        match self
            .authenticate("/v1/auth/refresh", &json!({ "refresh_token": token }))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(StoreError::AuthFailure(reason)) => {
                info!(%reason, "Stored session is no longer valid");
                self.publish(AuthState::SignedOut);
                Ok(None)
            }
            Err(e) => {
                self.publish(AuthState::SignedOut);
                Err(e)
            }
        }
    }

    /// Exchanges the current refresh token for a fresh token pair
    ///
    /// A rejected refresh token ends the session.
    ///
    /// # Errors
    ///
    /// - `StoreError::Unauthorized` if nobody is signed in
    /// - `StoreError::AuthFailure` if the refresh token was rejected
    pub async fn refresh(&self) -> StoreResult<AuthUser> {
        let token = self
            .refresh_token()
            .await
            .ok_or_else(|| StoreError::Unauthorized("Not signed in".to_string()))?;

        let result = self
            .authenticate("/v1/auth/refresh", &json!({ "refresh_token": token }))
            .await;

        if let Err(StoreError::AuthFailure(ref reason)) = result {
            self.expire_session(reason).await;
        }
        result
    }

    /// Refreshes the session if the access token expires within `margin`
    ///
    /// Returns `true` when a new token pair was fetched.
    pub async fn refresh_if_expiring(&self, margin: Duration) -> StoreResult<bool> {
        let expiring = match self.session.read().await.as_ref() {
            Some(session) => session.expires_at <= Instant::now() + margin,
            None => return Ok(false),
        };

        if !expiring {
            return Ok(false);
        }

        self.refresh().await?;
        Ok(true)
    }

    async fn expire_session(&self, reason: &str) {
        if let Some(session) = self.session.write().await.take() {
            info!(uid = %session.user.uid, %reason, "Session expired");
            self.publish(AuthState::SignedOut);
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn documents_url(&self, collection: Collection) -> String {
        self.url(&format!("/v1/collections/{}/documents", collection))
    }

    fn document_url(&self, collection: Collection, id: Uuid) -> String {
        format!("{}/{}", self.documents_url(collection), id)
    }

    fn publish(&self, state: AuthState) {
        self.auth_tx.send_replace(state);
    }

    async fn authorized(&self, request: RequestBuilder) -> StoreResult<RequestBuilder> {
        let session = self.session.read().await;
        let session = session
            .as_ref()
            .ok_or_else(|| StoreError::Unauthorized("Not signed in".to_string()))?;

        Ok(request.bearer_auth(&session.access_token))
    }

    /// Sends a document request and maps non-success statuses to errors
    async fn send(&self, request: RequestBuilder, collection: Collection) -> StoreResult<Response> {
        let response = self.authorized(request).await?.send().await.map_err(network)?;

        if response.status().is_success() {
            return Ok(response);
        }

        let error = error_from(response, Some(collection)).await;
        if let StoreError::Unauthorized(ref reason) = error {
            self.expire_session(reason).await;
        }
        Err(error)
    }

    /// Calls a sign-in style endpoint and installs the returned session
    async fn authenticate<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> StoreResult<AuthUser> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(network)?;

        if !response.status().is_success() {
            return Err(match error_from(response, None).await {
                StoreError::Unauthorized(msg)
                | StoreError::Forbidden(msg)
                | StoreError::Conflict(msg)
                | StoreError::Rejected(msg) => StoreError::AuthFailure(msg),
                other => other,
            });
        }

        let auth: AuthResponse = response.json().await.map_err(network)?;
        let user = auth.user.clone();

        *self.session.write().await = Some(Session {
            user: auth.user,
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            expires_at: Instant::now() + Duration::from_secs(auth.expires_in),
        });
        self.publish(AuthState::SignedIn(user.clone()));

        info!(uid = %user.uid, provider = %user.auth_provider, "Signed in");
        Ok(user)
    }
}

fn network(err: reqwest::Error) -> StoreError {
    StoreError::Network(err.to_string())
}

/// Maps an API error response to a store error
async fn error_from(response: Response, collection: Option<Collection>) -> StoreError {
    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = if body.message.is_empty() {
        status.to_string()
    } else {
        body.message
    };

    warn!(%status, error = %body.error, %message, "API request failed");

    match status {
        StatusCode::BAD_REQUEST => StoreError::Rejected(message),
        StatusCode::UNAUTHORIZED => StoreError::Unauthorized(message),
        StatusCode::FORBIDDEN => StoreError::Forbidden(message),
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::CONFLICT => StoreError::Conflict(message),
        StatusCode::UNPROCESSABLE_ENTITY => match collection {
            Some(collection) if body.error == "malformed_document" => {
                StoreError::Decode(DecodeError::Invalid {
                    collection,
                    reason: message,
                })
            }
            _ => StoreError::Rejected(message),
        },
        s if s.is_server_error() => StoreError::Internal(message),
        _ => StoreError::Network(format!("Unexpected response: {}", message)),
    }
}

#[async_trait]
impl DocumentStore for HttpRemote {
    async fn create_record(&self, collection: Collection, data: Document) -> StoreResult<Uuid> {
        let request = self.client.post(self.documents_url(collection)).json(&data);
        let created: StoredDocument = self
            .send(request, collection)
            .await?
            .json()
            .await
            .map_err(network)?;

        debug!(%collection, id = %created.id, "Created document");
        Ok(created.id)
    }

    async fn read_record(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> StoreResult<Option<StoredDocument>> {
        let request = self.client.get(self.document_url(collection, id));

        match self.send(request, collection).await {
            Ok(response) => Ok(Some(response.json().await.map_err(network)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_record(&self, collection: Collection, id: Uuid, data: Document) -> StoreResult<()> {
        let request = self.client.put(self.document_url(collection, id)).json(&data);
        self.send(request, collection).await?;
        Ok(())
    }

    async fn merge_record(&self, collection: Collection, id: Uuid, fields: Document) -> StoreResult<()> {
        let request = self.client.patch(self.document_url(collection, id)).json(&fields);
        self.send(request, collection).await?;
        Ok(())
    }

    async fn delete_record(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        let request = self.client.delete(self.document_url(collection, id));
        self.send(request, collection).await?;
        Ok(())
    }

    async fn query_records(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<StoredDocument>> {
        let encoded = value.to_string();
        let request = self
            .client
            .get(self.documents_url(collection))
            .query(&[("field", field), ("value", encoded.as_str())]);

        self.send(request, collection).await?.json().await.map_err(network)
    }
}

#[async_trait]
impl AuthService for HttpRemote {
    async fn sign_in_with_provider(&self, credential: ProviderCredential) -> StoreResult<AuthUser> {
        self.authenticate("/v1/auth/provider", &credential).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<AuthUser> {
        self.authenticate("/v1/auth/login", &Credentials { email, password })
            .await
    }

    async fn register_with_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> StoreResult<AuthUser> {
        self.authenticate(
            "/v1/auth/register",
            &Registration {
                name,
                email,
                password,
            },
        )
        .await
    }

    async fn send_password_reset(&self, email: &str) -> StoreResult<()> {
        let response = self
            .client
            .post(self.url("/v1/auth/password-reset"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(network)?;

        if !response.status().is_success() {
            return Err(error_from(response, None).await);
        }

        Ok(())
    }

    async fn sign_out(&self) -> StoreResult<()> {
        if let Some(session) = self.session.write().await.take() {
            info!(uid = %session.user.uid, "Signed out");
        }
        self.publish(AuthState::SignedOut);
        Ok(())
    }

    fn observe_auth_state(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }
}

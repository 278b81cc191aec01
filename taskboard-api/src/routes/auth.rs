/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create a password account and sign in
/// - `POST /v1/auth/login` - Sign in with email and password
/// - `POST /v1/auth/provider` - Sign in with a federated provider ID token
/// - `POST /v1/auth/refresh` - Restore a session from a refresh token
/// - `POST /v1/auth/password-reset` - Email a password reset link
/// - `POST /v1/auth/password-reset/confirm` - Set a new password with a reset token
///
/// Every sign-in style endpoint answers with an [`AuthResponse`].

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    mailer::reset_link,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskboard_shared::{
    auth::{jwt, password, provider},
    models::{
        account::{Account, CreateAccount},
        user::AuthProvider,
    },
    store::AuthUser,
};
use tracing::{info, warn};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (length rules in `password::validate_password_strength`)
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Provider sign-in request
#[derive(Debug, Deserialize)]
pub struct ProviderRequest {
    /// Issuing provider
    pub provider: AuthProvider,

    /// Provider-signed ID token
    pub id_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Password reset request
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    /// Account email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Password reset confirmation
#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    /// Token from the emailed link
    pub token: String,

    /// Replacement password
    pub new_password: String,
}

/// Session handed back after any successful sign-in
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Signed-in user
    pub user: AuthUser,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

fn auth_user(account: &Account) -> AuthUser {
    AuthUser {
        uid: account.id,
        email: account.email.clone(),
        name: account.display_name.clone(),
        auth_provider: account.provider(),
    }
}

fn session_response(state: &AppState, account: &Account) -> ApiResult<AuthResponse> {
    let tokens = jwt::issue_session(account.id, state.jwt_secret())?;

    Ok(AuthResponse {
        user: auth_user(account),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    })
}

fn check_password_strength(candidate: &str, field: &str) -> ApiResult<()> {
    password::validate_password_strength(candidate).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message,
        }])
    })
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

/// Register a new password account
///
/// Only the account is created here; the client writes the user document
/// (`users/{uid}`) with the session it gets back.
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;
    check_password_strength(&req.password, "password")?;

    let password_hash = password::hash_password(&req.password)?;

    let account = Account::create(
        &state.db,
        CreateAccount {
            email: req.email.trim().to_string(),
            password_hash: Some(password_hash),
            auth_provider: AuthProvider::Local,
            display_name: Some(req.name.trim().to_string()),
        },
    )
    .await?;

    info!(account_id = %account.id, "Registered account");

    Ok((StatusCode::CREATED, Json(session_response(&state, &account)?)))
}

/// Sign in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password, or a provider-only account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let account = Account::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let hash = account.password_hash.as_deref().ok_or_else(|| {
        ApiError::Unauthorized(format!(
            "This account signs in with {}",
            account.provider()
        ))
    })?;

    if !password::verify_password(&req.password, hash)? {
        warn!(account_id = %account.id, "Rejected login with wrong password");
        return Err(invalid_credentials());
    }

    Account::update_last_login(&state.db, account.id).await?;

    Ok(Json(session_response(&state, &account)?))
}

/// Sign in with a federated provider
///
/// Creates the account on first sign-in. An existing account with the same
/// email is signed in, since the provider has verified the address.
///
/// # Errors
///
/// - `400 Bad Request`: Provider is not federated
/// - `401 Unauthorized`: ID token invalid or expired
/// - `503 Service Unavailable`: Provider not configured
pub async fn provider_sign_in(
    State(state): State<AppState>,
    Json(req): Json<ProviderRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let secret = match req.provider {
        AuthProvider::Local => {
            return Err(ApiError::BadRequest("local is not a federated provider".to_string()))
        }
        AuthProvider::Google => state
            .config
            .provider
            .google_secret
            .as_deref()
            .ok_or_else(|| ApiError::ServiceUnavailable("google sign-in is not configured".to_string()))?,
    };

    let claims = provider::verify_id_token(req.provider, &req.id_token, secret)?;

    let account = match Account::find_by_email(&state.db, &claims.email).await? {
        Some(account) => account,
        None => {
            let account = Account::create(
                &state.db,
                CreateAccount {
                    email: claims.email.clone(),
                    password_hash: None,
                    auth_provider: req.provider,
                    display_name: claims.name.clone(),
                },
            )
            .await?;
            info!(account_id = %account.id, provider = %req.provider, "Created provider account");
            account
        }
    };

    Account::update_last_login(&state.db, account.id).await?;

    Ok(Json(session_response(&state, &account)?))
}

/// Restore a session from a refresh token
///
/// Issues a fresh token pair together with the user.
///
/// # Errors
///
/// - `401 Unauthorized`: Refresh token invalid/expired or account gone
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let account = Account::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(session_response(&state, &account)?))
}

/// Email a password reset link
///
/// Always answers `202 Accepted` for a well-formed email so the endpoint
/// cannot be used to probe which addresses are registered.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    req.validate()?;

    match Account::find_by_email(&state.db, req.email.trim()).await? {
        Some(account) if account.password_hash.is_some() => {
            let claims = jwt::Claims::new(account.id, jwt::TokenType::PasswordReset);
            let token = jwt::create_token(&claims, state.jwt_secret())?;
            let link = reset_link(&state.config.password_reset.url, &token);

            state
                .mailer
                .send_password_reset(&account.email, &link)
                .await
                .map_err(|e| ApiError::ServiceUnavailable(format!("Could not send email: {}", e)))?;

            info!(account_id = %account.id, "Sent password reset link");
        }
        Some(account) => {
            info!(account_id = %account.id, "Skipped password reset for provider account");
        }
        None => {}
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Password reset link sent" })),
    ))
}

/// Set a new password using a reset token
///
/// # Errors
///
/// - `401 Unauthorized`: Token invalid, expired, or not a reset token
/// - `422 Unprocessable Entity`: New password too short or too long
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetConfirm>,
) -> ApiResult<StatusCode> {
    let claims = jwt::validate_password_reset_token(&req.token, state.jwt_secret())?;
    check_password_strength(&req.new_password, "new_password")?;

    let password_hash = password::hash_password(&req.new_password)?;

    if !Account::update_password(&state.db, claims.sub, &password_hash).await? {
        return Err(ApiError::Unauthorized("Account no longer exists".to_string()));
    }

    info!(account_id = %claims.sub, "Password reset completed");
    Ok(StatusCode::NO_CONTENT)
}

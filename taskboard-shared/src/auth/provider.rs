/// Federated provider ID tokens
///
/// Provider sign-in hands the service an ID token issued by the identity
/// provider. Tokens are HS256 JWTs signed with a secret shared with the
/// provider integration; the issuer must be the provider's.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::provider::{issue_id_token, verify_id_token, ProviderClaims};
/// use taskboard_shared::models::user::AuthProvider;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = ProviderClaims::new(AuthProvider::Google, "1098", "g@example.com", Some("G".into()));
/// let token = issue_id_token(&claims, "provider-secret")?;
///
/// let verified = verify_id_token(AuthProvider::Google, &token, "provider-secret")?;
/// assert_eq!(verified.email, "g@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::AuthProvider;

/// Error type for provider token verification
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Provider is not a federated provider
    #[error("{0} is not a federated provider")]
    Unsupported(AuthProvider),

    /// Token is expired
    #[error("Provider token has expired")]
    Expired,

    /// Signature, issuer or shape is wrong
    #[error("Invalid provider token: {0}")]
    Invalid(String),
}

/// Claims carried by a provider ID token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderClaims {
    /// Provider-side subject
    pub sub: String,

    /// Verified email address
    pub email: String,

    /// Display name, if the provider shares one
    #[serde(default)]
    pub name: Option<String>,

    /// Provider issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl ProviderClaims {
    /// Creates claims valid for one hour
    pub fn new(
        provider: AuthProvider,
        sub: impl Into<String>,
        email: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        Self {
            sub: sub.into(),
            email: email.into(),
            name,
            iss: issuer(provider).unwrap_or_default().to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        }
    }
}

/// Issuer expected on tokens from `provider`
pub fn issuer(provider: AuthProvider) -> Option<&'static str> {
    match provider {
        AuthProvider::Google => Some("https://accounts.google.com"),
        AuthProvider::Local => None,
    }
}

/// Signs provider claims
///
/// Used by provider integrations and tests.
pub fn issue_id_token(claims: &ProviderClaims, secret: &str) -> Result<String, ProviderError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ProviderError::Invalid(e.to_string()))
}

/// Verifies a provider ID token
///
/// # Errors
///
/// - `ProviderError::Unsupported` for `AuthProvider::Local`
/// - `ProviderError::Expired` if the token is past `exp`
/// - `ProviderError::Invalid` for a bad signature, issuer or shape
pub fn verify_id_token(
    provider: AuthProvider,
    token: &str,
    secret: &str,
) -> Result<ProviderClaims, ProviderError> {
    let expected_issuer = issuer(provider).ok_or(ProviderError::Unsupported(provider))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[expected_issuer]);
    validation.validate_aud = false;

    let claims = decode::<ProviderClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ProviderError::Expired,
            _ => ProviderError::Invalid(e.to_string()),
        })?;

    if claims.email.trim().is_empty() {
        return Err(ProviderError::Invalid("Token carries no email".to_string()));
    }

    Ok(claims)
}

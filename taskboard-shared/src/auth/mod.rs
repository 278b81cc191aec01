/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and length rules
/// - [`jwt`]: Access, refresh and password-reset tokens
/// - [`provider`]: Federated provider ID token verification
/// - [`middleware`]: Bearer-token middleware and the `AuthContext` extractor
/// - [`authorization`]: Per-user document ownership rules
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{issue_session, validate_access_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let session = issue_session(Uuid::new_v4(), "secret-key")?;
/// validate_access_token(&session.access_token, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod provider;

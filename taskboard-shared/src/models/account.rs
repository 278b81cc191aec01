/// Account model and database operations
///
/// Accounts are the authentication-side view of a user: credentials and the
/// provider the user signed up with. The account id doubles as the session
/// identity issued in JWTs and as the key of the user's document in the
/// `users` collection.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL,
///     password_hash VARCHAR(255),
///     auth_provider TEXT NOT NULL DEFAULT 'local',
///     display_name VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// CREATE UNIQUE INDEX accounts_email_key ON accounts (lower(email));
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::account::{Account, CreateAccount};
/// use taskboard_shared::models::user::AuthProvider;
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let account = Account::create(
///     &pool,
///     CreateAccount {
///         email: "user@example.com".to_string(),
///         password_hash: Some("$argon2id$...".to_string()),
///         auth_provider: AuthProvider::Local,
///         display_name: Some("Jane Doe".to_string()),
///     },
/// )
/// .await?;
///
/// let found = Account::find_by_email(&pool, "USER@example.com").await?;
/// assert_eq!(found.map(|a| a.id), Some(account.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::AuthProvider;

/// Account row
///
/// Provider accounts have no password hash.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Account ID, also the session identity
    pub id: Uuid,

    /// Email address (unique, compared case-insensitively)
    pub email: String,

    /// Argon2id password hash, None for provider accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Provider tag ("local" or "google")
    pub auth_provider: String,

    /// Display name supplied at registration or by the provider
    pub display_name: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the account last signed in
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: Option<String>,

    /// Provider the account signs in with
    pub auth_provider: AuthProvider,

    /// Optional display name
    pub display_name: Option<String>,
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, auth_provider, display_name, \
                               created_at, updated_at, last_login_at";

impl Account {
    /// Parses the stored provider tag
    ///
    /// Unknown tags fall back to `Local`.
    pub fn provider(&self) -> AuthProvider {
        self.auth_provider.parse().unwrap_or(AuthProvider::Local)
    }

    /// Creates a new account
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint
    /// `accounts_email_key`) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (email, password_hash, auth_provider, display_name) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.auth_provider.as_str())
            .bind(data.display_name)
            .fetch_one(pool)
            .await
    }

    /// Finds an account by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);

        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an account by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM accounts WHERE lower(email) = lower($1)",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Replaces the password hash
    ///
    /// # Returns
    ///
    /// True if the account exists and was updated
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates the last login timestamp
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET last_login_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(provider: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            password_hash: None,
            auth_provider: provider.to_string(),
            display_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!(sample("google").provider(), AuthProvider::Google);
        assert_eq!(sample("local").provider(), AuthProvider::Local);
        assert_eq!(sample("legacy").provider(), AuthProvider::Local);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let mut account = sample("local");
        account.password_hash = Some("$argon2id$secret".to_string());

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2id"));
    }

    // Database round-trips live in tests/store_tests.rs
}

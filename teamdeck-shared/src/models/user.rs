/// User model and database operations
///
/// Users can belong to multiple organizations via the membership model.
/// Accounts created through an external identity provider carry no password
/// hash; password login is rejected for them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     name VARCHAR(255),
///     password_hash VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are normalized (trimmed, lowercased) at the application edge
/// before every insert and lookup; the unique constraint then compares the
/// normalized form byte-for-byte.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing an account
///
/// The password hash is excluded from serialization so it never leaks into
/// API responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, stored in normalized form
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Argon2id password hash; None for accounts provisioned via OAuth
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (caller should normalize first; see [`normalize_email`])
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Argon2id hash of the password (NOT the plaintext), or None for
    /// OAuth-only accounts
    pub password_hash: Option<String>,
}

/// Normalizes an email address for storage and lookup
///
/// Trims surrounding whitespace and lowercases the whole address. Both
/// registration and login pass addresses through this before touching
/// the database, so uniqueness holds regardless of the casing a client
/// sends.
///
/// # Example
///
/// ```
/// use teamdeck_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("  Jo@Example.COM "), "jo@example.com");
/// ```
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint
    /// violation) or the database is unreachable. The unique constraint is
    /// the enforcement mechanism for email uniqueness; any application-level
    /// existence check is only an early exit.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password_hash, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by normalized email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether a user with the given normalized email exists
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Deletes a user by ID
    ///
    /// Cascades to memberships and refresh tokens through the storage
    /// layer's referential rules.
    ///
    /// # Returns
    ///
    /// True if a user was deleted, false if the id did not resolve
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

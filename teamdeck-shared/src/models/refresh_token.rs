/// Refresh-token store
///
/// Access tokens are stateless, so revoking a session has to happen here:
/// every issued refresh token gets one row, logout deletes matching rows,
/// and a refresh that finds no row fails. Tokens are stored as SHA-256
/// hashes; the plaintext token only ever exists on the client.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// A row is valid iff it exists and `expires_at` is in the future. There is
/// no background sweep: stale rows are removed when a refresh or logout
/// touches them, and the per-user cap enforced by [`RefreshToken::prune_user`]
/// bounds accumulation across repeated logins.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Persisted refresh-token record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    /// Unique row ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// SHA-256 hex digest of the issued token string
    pub token_hash: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Hashes a token string for storage and lookup
    ///
    /// # Example
    ///
    /// ```
    /// use teamdeck_shared::models::refresh_token::RefreshToken;
    ///
    /// let hash = RefreshToken::hash_token("eyJhbGciOi...");
    /// assert_eq!(hash.len(), 64); // SHA-256 hex
    /// ```
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Checks if the stored expiry has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Inserts a new refresh-token row
    pub async fn insert(
        pool: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Looks up a row by token hash
    pub async fn find_by_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Deletes all rows matching a token hash
    ///
    /// Deleting zero rows is not an error; logout relies on that for
    /// idempotence.
    ///
    /// # Returns
    ///
    /// Number of rows deleted
    pub async fn delete_by_hash(pool: &PgPool, token_hash: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Counts live rows for a user
    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Keeps only the newest `keep` rows for a user, deleting the rest
    ///
    /// Each login inserts a fresh row (multi-device support), so without a
    /// cap a single user could accumulate rows without bound.
    ///
    /// # Returns
    ///
    /// Number of rows pruned
    pub async fn prune_user(pool: &PgPool, user_id: Uuid, keep: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE user_id = $1
              AND id NOT IN (
                  SELECT id FROM refresh_tokens
                  WHERE user_id = $1
                  ORDER BY created_at DESC, id DESC
                  LIMIT $2
              )
            "#,
        )
        .bind(user_id)
        .bind(keep)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_hash_token_shape() {
        let hash = RefreshToken::hash_token("some-token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_token_deterministic() {
        assert_eq!(
            RefreshToken::hash_token("token-a"),
            RefreshToken::hash_token("token-a")
        );
        assert_ne!(
            RefreshToken::hash_token("token-a"),
            RefreshToken::hash_token("token-b")
        );
    }

    #[test]
    fn test_is_expired() {
        let mut token = RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: RefreshToken::hash_token("t"),
            expires_at: Utc::now() + Duration::days(7),
            created_at: Utc::now(),
        };

        assert!(!token.is_expired());

        token.expires_at = Utc::now() - Duration::seconds(1);
        assert!(token.is_expired());
    }
}

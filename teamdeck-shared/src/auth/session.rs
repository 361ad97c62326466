/// Session orchestration: register, login, refresh, logout
///
/// The session service drives the per-user session state machine
/// (Anonymous → Authenticated → Refreshed* → LoggedOut) on top of the
/// user/membership models, the password hasher, the token issuer, and the
/// refresh-token store. It owns a dependency-injected pool and the token
/// settings; construct it once at startup and clone it into request state.
///
/// # Failure semantics
///
/// Login failures are deliberately uninformative: an unknown email, an
/// OAuth-only account, and a wrong password all surface as
/// `InvalidCredentials`, so callers cannot probe which addresses are
/// registered. Token failures distinguish `TokenExpired` from
/// `TokenInvalid` because clients refresh on the former and re-login on
/// the latter.
///
/// # Concurrency
///
/// Two simultaneous logins for the same user insert two independent
/// refresh-token rows (multi-device support). Registration's email check
/// is only an early exit; the unique constraint on `users.email` is the
/// enforcement mechanism, and a constraint violation surfaces as
/// `EmailAlreadyExists` just like the early exit does.

use chrono::Duration;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::jwt::{self, Claims, JwtError};
use super::password::{self, PasswordError};
use crate::models::membership::{MemberRole, Membership, MembershipWithOrganization};
use crate::models::refresh_token::RefreshToken;
use crate::models::user::{normalize_email, CreateUser, User};

/// Ceiling on live refresh-token rows per user
///
/// Each login inserts a row; the oldest rows beyond this are pruned so a
/// single account cannot accumulate sessions without bound.
pub const MAX_SESSIONS_PER_USER: i64 = 20;

/// Token secrets and lifetimes for the session service
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// HS256 secret for access tokens
    pub access_secret: String,

    /// HS256 secret for refresh tokens
    pub refresh_secret: String,

    /// Access-token lifetime (default 15 minutes)
    pub access_ttl: Duration,

    /// Refresh-token lifetime (default 7 days)
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    /// Creates settings with the default lifetimes
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }

    /// Overrides the token lifetimes
    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }
}

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A user with this email already exists
    #[error("email is already registered")]
    EmailAlreadyExists,

    /// Unknown email or wrong password (indistinguishable by design)
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Refresh token failed signature verification, was malformed, or is
    /// absent from the store
    #[error("refresh token is not valid")]
    TokenInvalid,

    /// Refresh token is past its expiry
    #[error("refresh token has expired")]
    TokenExpired,

    /// The user id no longer resolves (deleted after token issuance)
    #[error("user not found")]
    UserNotFound,

    /// Password hashing/verification failed
    #[error("password operation failed: {0}")]
    Password(#[from] PasswordError),

    /// Token signing failed
    #[error("token signing failed: {0}")]
    Signing(JwtError),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An issued access/refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Short-lived access token
    pub access_token: String,

    /// Long-lived, persisted refresh token
    pub refresh_token: String,
}

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct LoginSession {
    /// The authenticated user
    pub user: User,

    /// The user's organizations (empty right after registration)
    pub organizations: Vec<MembershipWithOrganization>,

    /// The issued tokens
    pub tokens: TokenPair,
}

/// A user together with their organization memberships
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    /// The user record
    pub user: User,

    /// Their organizations
    pub organizations: Vec<MembershipWithOrganization>,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint().is_some(),
        _ => false,
    }
}

/// The session service
#[derive(Clone)]
pub struct SessionService {
    db: PgPool,
    tokens: Arc<TokenSettings>,
}

impl SessionService {
    /// Creates the service over a pool and token settings
    pub fn new(db: PgPool, tokens: TokenSettings) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
        }
    }

    /// Registers a new user and opens their first session
    ///
    /// The password is hashed on the blocking pool. The issued access token
    /// carries no organization claims, since a fresh account has no
    /// memberships.
    ///
    /// # Errors
    ///
    /// - `SessionError::EmailAlreadyExists` when the email is taken
    pub async fn register(
        &self,
        name: Option<String>,
        email: &str,
        password: &str,
    ) -> Result<LoginSession, SessionError> {
        let email = normalize_email(email);

        // Early exit; the unique constraint remains the enforcement
        if User::email_exists(&self.db, &email).await? {
            return Err(SessionError::EmailAlreadyExists);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|e| PasswordError::HashError(format!("hashing task aborted: {}", e)))??;

        let user = User::create(
            &self.db,
            CreateUser {
                email,
                name,
                password_hash: Some(password_hash),
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SessionError::EmailAlreadyExists
            } else {
                SessionError::Database(e)
            }
        })?;

        let tokens = self.issue_and_store(&user, None).await?;

        Ok(LoginSession {
            user,
            organizations: Vec::new(),
            tokens,
        })
    }

    /// Authenticates a user by email and password
    ///
    /// On success the user's oldest membership (their default organization)
    /// is embedded into the access token, and a fresh refresh-token row is
    /// inserted.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidCredentials` for unknown email, OAuth-only
    ///   account, or wrong password
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, SessionError> {
        let email = normalize_email(email);

        let user = User::find_by_email(&self.db, &email)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        // OAuth-only accounts have no password to check
        let hash = user
            .password_hash
            .clone()
            .ok_or(SessionError::InvalidCredentials)?;

        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|e| PasswordError::VerifyError(format!("verify task aborted: {}", e)))??;

        if !valid {
            return Err(SessionError::InvalidCredentials);
        }

        let organizations = Membership::list_for_user(&self.db, user.id).await?;
        let org_claims = organizations
            .first()
            .map(|m| (m.organization_id, m.role));

        let tokens = self.issue_and_store(&user, org_claims).await?;

        Ok(LoginSession {
            user,
            organizations,
            tokens,
        })
    }

    /// Exchanges a refresh token for a new token pair
    ///
    /// The signature and embedded expiry are checked first, then the token
    /// must still exist in the store. Refresh tokens rotate: the consumed
    /// row is deleted and a new refresh token is issued alongside the new
    /// access token, so a replayed token fails with `TokenInvalid`.
    /// Organization claims are re-resolved, picking up membership changes
    /// since the last issuance.
    ///
    /// # Errors
    ///
    /// - `SessionError::TokenInvalid` - bad signature, malformed, wrong
    ///   type, or absent from the store (e.g. after logout or rotation)
    /// - `SessionError::TokenExpired` - embedded or stored expiry passed
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = jwt::verify_refresh_token(refresh_token, &self.tokens.refresh_secret)
            .map_err(|e| match e {
                JwtError::Expired => SessionError::TokenExpired,
                _ => SessionError::TokenInvalid,
            })?;

        let hash = RefreshToken::hash_token(refresh_token);
        let stored = RefreshToken::find_by_hash(&self.db, &hash)
            .await?
            .ok_or(SessionError::TokenInvalid)?;

        if stored.is_expired() {
            // Stale row; remove it on this touch
            RefreshToken::delete_by_hash(&self.db, &hash).await?;
            return Err(SessionError::TokenExpired);
        }

        let user = User::find_by_id(&self.db, claims.sub)
            .await?
            .ok_or(SessionError::TokenInvalid)?;

        let organizations = Membership::list_for_user(&self.db, user.id).await?;
        let org_claims = organizations
            .first()
            .map(|m| (m.organization_id, m.role));

        // Rotation: consume the old row before persisting the replacement
        RefreshToken::delete_by_hash(&self.db, &hash).await?;
        let tokens = self.issue_and_store(&user, org_claims).await?;

        Ok(tokens)
    }

    /// Revokes a refresh token
    ///
    /// Deletes every stored row matching the token. Idempotent: deleting
    /// zero rows still succeeds, so a double logout is not an error.
    ///
    /// # Returns
    ///
    /// The number of rows revoked
    pub async fn logout(&self, refresh_token: &str) -> Result<u64, SessionError> {
        let hash = RefreshToken::hash_token(refresh_token);
        let revoked = RefreshToken::delete_by_hash(&self.db, &hash).await?;
        Ok(revoked)
    }

    /// Loads the current user with their memberships
    ///
    /// # Errors
    ///
    /// - `SessionError::UserNotFound` when the id does not resolve — a
    ///   known window, since access tokens outlive account deletion
    pub async fn current_user(&self, user_id: Uuid) -> Result<CurrentUser, SessionError> {
        let user = User::find_by_id(&self.db, user_id)
            .await?
            .ok_or(SessionError::UserNotFound)?;

        let organizations = Membership::list_for_user(&self.db, user.id).await?;

        Ok(CurrentUser {
            user,
            organizations,
        })
    }

    /// Issues a token pair and persists the refresh half
    async fn issue_and_store(
        &self,
        user: &User,
        org: Option<(Uuid, MemberRole)>,
    ) -> Result<TokenPair, SessionError> {
        let access_claims =
            Claims::access(user.id, user.email.clone(), org, self.tokens.access_ttl);
        let refresh_claims =
            Claims::refresh(user.id, user.email.clone(), self.tokens.refresh_ttl);

        let access_token = jwt::issue_token(&access_claims, &self.tokens.access_secret)
            .map_err(SessionError::Signing)?;
        let refresh_token = jwt::issue_token(&refresh_claims, &self.tokens.refresh_secret)
            .map_err(SessionError::Signing)?;

        let hash = RefreshToken::hash_token(&refresh_token);
        let expires_at = chrono::Utc::now() + self.tokens.refresh_ttl;
        RefreshToken::insert(&self.db, user.id, &hash, expires_at).await?;

        let pruned = RefreshToken::prune_user(&self.db, user.id, MAX_SESSIONS_PER_USER).await?;
        if pruned > 0 {
            tracing::debug!(user_id = %user.id, pruned, "pruned refresh tokens over session cap");
        }

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

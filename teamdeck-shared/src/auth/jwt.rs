/// Signed token issuing and verification
///
/// Tokens are HS256 JWTs. Access and refresh tokens are signed with
/// **separate secrets**, so a refresh token can never pass access-token
/// verification even if a type check were skipped.
///
/// # Token Types
///
/// - **Access**: short-lived (default 15 minutes), stateless, carries the
///   user's identity plus an optional organization context
/// - **Refresh**: long-lived (default 7 days), only ever exchanged for new
///   tokens; the session layer additionally persists it so it can be
///   revoked
///
/// Verification distinguishes an expired token from an invalid one because
/// clients react differently: expiry triggers a refresh attempt, anything
/// else forces a fresh login.
///
/// # Example
///
/// ```
/// use teamdeck_shared::auth::jwt::{issue_token, verify_access_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::access(
///     Uuid::new_v4(),
///     "user@example.com".to_string(),
///     None,
///     Duration::minutes(15),
/// );
/// let token = issue_token(&claims, "a-secret-of-at-least-32-characters!!")?;
/// let verified = verify_access_token(&token, "a-secret-of-at-least-32-characters!!")?;
/// assert_eq!(verified.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::membership::MemberRole;

/// Issuer claim stamped into every token
pub const ISSUER: &str = "teamdeck";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token
    #[error("Failed to sign token: {0}")]
    Signing(String),

    /// Signature did not verify, payload malformed, or wrong token type
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Signature valid but the expiry has passed
    #[error("Token has expired")]
    Expired,
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived API credential
    Access,

    /// Long-lived credential exchanged for new token pairs
    Refresh,
}

impl TokenType {
    /// Gets the token type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// Standard claims (`sub`, `iss`, `iat`, `nbf`, `exp`) plus the Teamdeck
/// identity claims. Organization context is optional: a freshly registered
/// user has no membership yet, and refresh tokens never carry one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// User email at issuance time
    pub email: String,

    /// Issuer - always "teamdeck"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Organization the token is scoped to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<Uuid>,

    /// The user's role in that organization, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,

    /// Access or refresh
    pub token_type: TokenType,
}

impl Claims {
    /// Creates access-token claims
    ///
    /// # Arguments
    ///
    /// * `user_id` - subject
    /// * `email` - user email
    /// * `org` - optional organization context `(org_id, role)`
    /// * `ttl` - token lifetime
    pub fn access(
        user_id: Uuid,
        email: String,
        org: Option<(Uuid, MemberRole)>,
        ttl: Duration,
    ) -> Self {
        Self::new(user_id, email, org, TokenType::Access, ttl)
    }

    /// Creates refresh-token claims
    ///
    /// Refresh tokens carry identity only; organization context is resolved
    /// fresh whenever a new access token is minted from them.
    pub fn refresh(user_id: Uuid, email: String, ttl: Duration) -> Self {
        Self::new(user_id, email, None, TokenType::Refresh, ttl)
    }

    fn new(
        user_id: Uuid,
        email: String,
        org: Option<(Uuid, MemberRole)>,
        token_type: TokenType,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        let (org_id, role) = match org {
            Some((id, role)) => (Some(id), Some(role)),
            None => (None, None),
        };

        Self {
            sub: user_id,
            email,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ttl).timestamp(),
            org_id,
            role,
            token_type,
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a compact JWT
///
/// # Errors
///
/// Returns `JwtError::Signing` if encoding fails
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::Signing(format!("encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Checks signature, `exp`, `nbf`, issuer, and that the token type matches
/// `expected`.
///
/// # Errors
///
/// - `JwtError::Expired` when the signature is valid but `exp` has passed
/// - `JwtError::Invalid` for every other failure (bad signature, malformed
///   payload, wrong issuer, wrong token type)
fn verify_token(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(format!("validation failed: {}", e)),
    })?;

    let claims = token_data.claims;
    if claims.token_type != expected {
        return Err(JwtError::Invalid(format!(
            "expected {} token, got {} token",
            expected.as_str(),
            claims.token_type.as_str()
        )));
    }

    Ok(claims)
}

/// Validates an access token against the access-token secret
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    verify_token(token, secret, TokenType::Access)
}

/// Validates a refresh token against the refresh-token secret
///
/// This only proves the token was issued by us and has not expired; whether
/// it is still *live* is decided by the refresh-token store.
pub fn verify_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    verify_token(token, secret, TokenType::Refresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";
    const OTHER_SECRET: &str = "another-secret-key-also-32-bytes-long";

    fn access_claims() -> Claims {
        Claims::access(
            Uuid::new_v4(),
            "user@example.com".to_string(),
            None,
            Duration::minutes(15),
        )
    }

    #[test]
    fn test_claims_defaults() {
        let claims = access_claims();
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.org_id.is_none());
        assert!(claims.role.is_none());
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_with_org_context() {
        let org_id = Uuid::new_v4();
        let claims = Claims::access(
            Uuid::new_v4(),
            "user@example.com".to_string(),
            Some((org_id, MemberRole::Admin)),
            Duration::minutes(15),
        );

        assert_eq!(claims.org_id, Some(org_id));
        assert_eq!(claims.role, Some(MemberRole::Admin));
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let claims = access_claims();
        let token = issue_token(&claims, SECRET).expect("Should sign token");

        let verified = verify_access_token(&token, SECRET).expect("Should verify");
        assert_eq!(verified.sub, claims.sub);
        assert_eq!(verified.email, claims.email);
        assert_eq!(verified.token_type, TokenType::Access);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = issue_token(&access_claims(), SECRET).unwrap();

        let result = verify_access_token(&token, OTHER_SECRET);
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        // Expired well past jsonwebtoken's default leeway
        let claims = Claims::access(
            Uuid::new_v4(),
            "user@example.com".to_string(),
            None,
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());

        let token = issue_token(&claims, SECRET).unwrap();
        let result = verify_access_token(&token, SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_malformed_token_is_invalid_not_expired() {
        let result = verify_access_token("not.a.jwt", SECRET);
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let claims = Claims::refresh(
            Uuid::new_v4(),
            "user@example.com".to_string(),
            Duration::days(7),
        );
        let token = issue_token(&claims, SECRET).unwrap();

        let result = verify_access_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let token = issue_token(&access_claims(), SECRET).unwrap();

        let result = verify_refresh_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_refresh_roundtrip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::refresh(user_id, "user@example.com".to_string(), Duration::days(7));
        let token = issue_token(&claims, SECRET).unwrap();

        let verified = verify_refresh_token(&token, SECRET).expect("Should verify");
        assert_eq!(verified.sub, user_id);
        assert_eq!(verified.token_type, TokenType::Refresh);
        assert!(verified.org_id.is_none());
    }

    #[test]
    fn test_separate_secrets_isolate_token_kinds() {
        // Refresh token signed with the refresh secret never verifies
        // against the access secret
        let claims = Claims::refresh(
            Uuid::new_v4(),
            "user@example.com".to_string(),
            Duration::days(7),
        );
        let token = issue_token(&claims, OTHER_SECRET).unwrap();

        assert!(verify_access_token(&token, SECRET).is_err());
        assert!(verify_refresh_token(&token, SECRET).is_err());
        assert!(verify_refresh_token(&token, OTHER_SECRET).is_ok());
    }
}

/// Request authentication context
///
/// The HTTP layer validates the bearer token once per request and stores an
/// [`AuthContext`] in the request extensions; handlers extract it with
/// Axum's `Extension` extractor. Header parsing lives here so the API crate
/// and any future callers reject malformed credentials identically, before
/// any business logic runs.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use teamdeck_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("user {} ({})", auth.user_id, auth.email)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::membership::MemberRole;

/// Authentication context derived from a verified access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email claim from the token
    pub email: String,

    /// Organization the token was scoped to, if any
    pub org_id: Option<Uuid>,

    /// The user's role in that organization at issuance time
    pub role: Option<MemberRole>,
}

impl AuthContext {
    /// Builds the context from verified access-token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            org_id: claims.org_id,
            role: claims.role,
        }
    }
}

/// Error type for credential extraction
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header was sent
    #[error("missing credentials")]
    MissingCredentials,

    /// The Authorization header is not a Bearer token
    #[error("invalid authorization header: {0}")]
    InvalidFormat(String),
}

/// Extracts the bearer token from a request's headers
///
/// # Errors
///
/// - `AuthError::MissingCredentials` - no Authorization header
/// - `AuthError::InvalidFormat` - header present but not `Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("expected Bearer token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;
    use chrono::{Duration, Utc};

    #[test]
    fn test_auth_context_from_claims() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: "user@example.com".to_string(),
            iss: "teamdeck".to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + Duration::minutes(15)).timestamp(),
            org_id: Some(org_id),
            role: Some(MemberRole::Member),
            token_type: TokenType::Access,
        };

        let context = AuthContext::from_claims(&claims);

        assert_eq!(context.user_id, user_id);
        assert_eq!(context.email, "user@example.com");
        assert_eq!(context.org_id, Some(org_id));
        assert_eq!(context.role, Some(MemberRole::Member));
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());

        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_bearer(&headers),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

        assert!(matches!(
            extract_bearer(&headers),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_extract_bearer_empty_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());

        assert!(matches!(
            extract_bearer(&headers),
            Err(AuthError::InvalidFormat(_))
        ));
    }
}

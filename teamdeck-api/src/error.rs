/// Error handling for the API server
///
/// Every handler returns `Result<T, ApiError>`. The error converts into an
/// HTTP response whose JSON body carries a **stable machine-readable
/// `error` code** alongside a human-readable message, so clients can branch
/// programmatically — in particular, `token_expired` triggers a refresh
/// attempt while `token_invalid` forces a re-login.
///
/// Business errors from the shared crate map losslessly onto these codes;
/// unexpected errors (storage unreachable, signing failure) become a masked
/// 500 and are logged.
///
/// # Example
///
/// ```no_run
/// use teamdeck_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use teamdeck_shared::auth::{
    jwt::JwtError, middleware::AuthError, password::PasswordError, permission::PermissionError,
    session::SessionError, tenant::TenantError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Missing organization id on a tenant-scoped request (400)
    OrganizationIdRequired,

    /// Missing or malformed credentials (401)
    Unauthorized(String),

    /// Unknown email or wrong password (401)
    InvalidCredentials,

    /// Token failed verification or is absent from the store (401)
    TokenInvalid(String),

    /// Token signature valid but past expiry (401)
    TokenExpired,

    /// Caller is not a member of the target organization (403)
    OrgAccessDenied,

    /// The organization's subscription is not active (403)
    OrgInactive,

    /// Role lacks the permission for this action (403)
    PermissionDenied(String),

    /// Generic not found (404)
    NotFound(String),

    /// Token subject no longer resolves to a user (404)
    UserNotFound,

    /// Membership not found in the target organization (404)
    MemberNotFound,

    /// Conflict with a stable sub-code, e.g. duplicate email (409)
    Conflict {
        /// Stable code: "email_exists", "slug_taken", ...
        code: &'static str,
        /// Human-readable message
        message: String,
    },

    /// Request validation failed (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Too many requests (429)
    RateLimitExceeded {
        /// Seconds until the client may retry
        retry_after: u64,
    },

    /// Internal server error (500); message is logged, not returned
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code (e.g. "invalid_credentials", "token_expired")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level validation errors, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// The stable code serialized into the response body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::OrganizationIdRequired => "org_id_required",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::TokenInvalid(_) => "token_invalid",
            ApiError::TokenExpired => "token_expired",
            ApiError::OrgAccessDenied => "org_access_denied",
            ApiError::OrgInactive => "org_inactive",
            ApiError::PermissionDenied(_) => "permission_denied",
            ApiError::NotFound(_) => "not_found",
            ApiError::UserNotFound => "user_not_found",
            ApiError::MemberNotFound => "member_not_found",
            ApiError::Conflict { code, .. } => code,
            ApiError::ValidationError(_) => "validation_error",
            ApiError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    /// The HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::OrganizationIdRequired => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_)
            | ApiError::InvalidCredentials
            | ApiError::TokenInvalid(_)
            | ApiError::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiError::OrgAccessDenied | ApiError::OrgInactive | ApiError::PermissionDenied(_) => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) | ApiError::UserNotFound | ApiError::MemberNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::OrganizationIdRequired => write!(f, "Organization id is required"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::InvalidCredentials => write!(f, "Invalid email or password"),
            ApiError::TokenInvalid(msg) => write!(f, "Invalid token: {}", msg),
            ApiError::TokenExpired => write!(f, "Token has expired"),
            ApiError::OrgAccessDenied => write!(f, "No access to this organization"),
            ApiError::OrgInactive => write!(f, "Organization is not active"),
            ApiError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::UserNotFound => write!(f, "User not found"),
            ApiError::MemberNotFound => write!(f, "Member not found"),
            ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::RateLimitExceeded { retry_after } => {
                write!(f, "Rate limit exceeded, retry in {}s", retry_after)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Rate limits carry a Retry-After header alongside the body
        if let ApiError::RateLimitExceeded { retry_after } = &self {
            let body = Json(ErrorResponse {
                error: self.code().to_string(),
                message: self.to_string(),
                details: None,
            });

            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
            return response;
        }

        let status = self.status();
        let code = self.code().to_string();

        let (message, details) = match self {
            ApiError::InternalError(msg) => {
                // Log the detail, return a masked message
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            other => (other.to_string(), None),
        };

        let body = Json(ErrorResponse {
            error: code,
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Converts validator's field errors into the response shape
pub fn map_validation_errors(errors: validator::ValidationErrors) -> ApiError {
    let details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    ApiError::ValidationError(details)
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict {
                            code: "email_exists",
                            message: "Email already exists".to_string(),
                        };
                    }
                    if constraint.contains("slug") {
                        return ApiError::Conflict {
                            code: "slug_taken",
                            message: "Slug is already taken".to_string(),
                        };
                    }
                    if constraint.contains("memberships_pkey") {
                        return ApiError::Conflict {
                            code: "member_exists",
                            message: "User is already a member".to_string(),
                        };
                    }
                    return ApiError::Conflict {
                        code: "conflict",
                        message: format!("Constraint violation: {}", constraint),
                    };
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert session errors to API errors
impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::EmailAlreadyExists => ApiError::Conflict {
                code: "email_exists",
                message: "Email is already registered".to_string(),
            },
            SessionError::InvalidCredentials => ApiError::InvalidCredentials,
            SessionError::TokenInvalid => {
                ApiError::TokenInvalid("Refresh token is not valid".to_string())
            }
            SessionError::TokenExpired => ApiError::TokenExpired,
            SessionError::UserNotFound => ApiError::UserNotFound,
            SessionError::Password(e) => {
                ApiError::InternalError(format!("Password operation failed: {}", e))
            }
            SessionError::Signing(e) => {
                ApiError::InternalError(format!("Token signing failed: {}", e))
            }
            SessionError::Database(e) => e.into(),
        }
    }
}

/// Convert tenant-resolution errors to API errors
impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::OrganizationIdRequired => ApiError::OrganizationIdRequired,
            TenantError::AccessDenied(_) => ApiError::OrgAccessDenied,
            TenantError::Inactive(_) => ApiError::OrgInactive,
            TenantError::Database(e) => e.into(),
        }
    }
}

/// Convert permission errors to API errors
impl From<PermissionError> for ApiError {
    fn from(err: PermissionError) -> Self {
        ApiError::PermissionDenied(err.to_string())
    }
}

/// Convert credential-extraction errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing authorization header".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert access-token verification errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::TokenExpired,
            JwtError::Invalid(msg) => ApiError::TokenInvalid(msg),
            JwtError::Signing(msg) => ApiError::InternalError(format!("Signing failed: {}", msg)),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

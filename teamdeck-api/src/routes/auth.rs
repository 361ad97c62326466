/// Session endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - create an account and open a session
/// - `POST /v1/auth/login` - authenticate and get a token pair
/// - `POST /v1/auth/refresh` - exchange a refresh token for a new pair
/// - `POST /v1/auth/logout` - revoke a refresh token (idempotent)
/// - `GET  /v1/auth/me` - current user with memberships (bearer auth)
///
/// The register/login/refresh/logout handlers are thin: validation and
/// error mapping live here, session semantics live in the shared
/// `SessionService`.

use crate::{
    app::AppState,
    error::{map_validation_errors, ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use teamdeck_shared::auth::middleware::AuthContext;
use teamdeck_shared::auth::password::validate_password_policy;
use teamdeck_shared::models::membership::MembershipWithOrganization;
use teamdeck_shared::models::user::User;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (checked against the password policy)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
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

/// Register/login response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The authenticated user (password hash never serialized)
    pub user: User,

    /// The user's organizations; empty right after registration
    pub organizations: Vec<MembershipWithOrganization>,

    /// Short-lived access token
    pub access_token: String,

    /// Long-lived refresh token
    pub refresh_token: String,
}

/// Refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token from a previous register/login/refresh
    pub refresh_token: String,
}

/// Refresh response
///
/// Refresh tokens rotate: the returned refresh token replaces the one the
/// client sent, which is no longer valid.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token
    pub access_token: String,

    /// New refresh token
    pub refresh_token: String,
}

/// Logout request
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to revoke
    pub refresh_token: String,
}

/// Simple acknowledgement response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable acknowledgement
    pub message: String,
}

/// Current-user response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The user record
    pub user: User,

    /// Their organizations
    pub organizations: Vec<MembershipWithOrganization>,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// {"name": "Jo Field", "email": "jo@example.com", "password": "workable9pass"}
/// ```
///
/// # Errors
///
/// - `422 validation_error`: bad email shape or weak password
/// - `409 email_exists`: the email is already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.validate().map_err(map_validation_errors)?;

    validate_password_policy(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    let session = state
        .sessions
        .register(req.name, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user: session.user,
            organizations: session.organizations,
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
        }),
    ))
}

/// Login
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// {"email": "jo@example.com", "password": "workable9pass"}
/// ```
///
/// # Errors
///
/// - `401 invalid_credentials`: unknown email or wrong password, not
///   distinguished
/// - `429 rate_limit_exceeded`: too many attempts from this client
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate().map_err(map_validation_errors)?;

    let session = state.sessions.login(&req.email, &req.password).await?;

    Ok(Json(SessionResponse {
        user: session.user,
        organizations: session.organizations,
        access_token: session.tokens.access_token,
        refresh_token: session.tokens.refresh_token,
    }))
}

/// Exchange a refresh token for a new token pair
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/refresh
/// {"refresh_token": "eyJ..."}
/// ```
///
/// # Errors
///
/// - `401 token_invalid`: bad signature, malformed, or revoked
/// - `401 token_expired`: past expiry; the client must log in again
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let tokens = state.sessions.refresh(&req.refresh_token).await?;

    Ok(Json(RefreshResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Revoke a refresh token
///
/// Idempotent: revoking an unknown or already-revoked token still returns
/// success.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/logout
/// {"refresh_token": "eyJ..."}
/// ```
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.sessions.logout(&req.refresh_token).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Current user
///
/// # Endpoint
///
/// ```text
/// GET /v1/auth/me
/// Authorization: Bearer <access token>
/// ```
///
/// # Errors
///
/// - `401`: missing/invalid/expired token (rejected by middleware)
/// - `404 user_not_found`: token subject no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let current = state.sessions.current_user(auth.user_id).await?;

    Ok(Json(MeResponse {
        user: current.user,
        organizations: current.organizations,
    }))
}

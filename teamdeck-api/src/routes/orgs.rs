/// Organization and membership endpoints
///
/// Every organization-scoped handler follows the same sequence: resolve
/// the tenant (membership + subscription status), then check the action
/// against the permission table, then execute. The permission check always
/// runs before the mutation, never after.
///
/// # Endpoints
///
/// - `POST   /v1/orgs` - create an organization (caller becomes owner)
/// - `GET    /v1/orgs` - list the caller's organizations
/// - `GET    /v1/orgs/:org_id/members` - list members
/// - `POST   /v1/orgs/:org_id/members` - add a member by email
/// - `PATCH  /v1/orgs/:org_id/members/:user_id` - change a member's role
/// - `DELETE /v1/orgs/:org_id/members/:user_id` - remove a member

use crate::{
    app::AppState,
    error::{map_validation_errors, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamdeck_shared::auth::middleware::AuthContext;
use teamdeck_shared::auth::permission::{require, Action};
use teamdeck_shared::models::membership::{
    CreateMembership, MemberDetail, MemberRole, Membership, MembershipWithOrganization,
};
use teamdeck_shared::models::organization::{CreateOrganization, Organization, SubscriptionTier};
use teamdeck_shared::models::user::{normalize_email, User};
use uuid::Uuid;
use validator::Validate;

/// Create-organization request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrgRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Explicit slug; derived from the name when absent
    #[validate(length(min = 1, max = 100, message = "Slug must be 1-100 characters"))]
    pub slug: Option<String>,
}

/// Add-member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    /// Email of the user to add; the account must already exist
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Role to assign (defaults to member)
    #[serde(default = "default_member_role")]
    pub role: MemberRole,
}

fn default_member_role() -> MemberRole {
    MemberRole::Member
}

/// Update-member request
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// New role
    pub role: MemberRole,
}

/// Membership response
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the organization
    pub role: MemberRole,
}

/// Simple acknowledgement response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable acknowledgement
    pub message: String,
}

/// Create an organization
///
/// Any authenticated user may create an organization; they become its
/// owner. New organizations start on the free tier with an active
/// subscription.
///
/// # Errors
///
/// - `409 slug_taken`: an explicitly supplied slug is already in use
pub async fn create_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateOrgRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    req.validate().map_err(map_validation_errors)?;

    let organization = Organization::create(
        &state.db,
        CreateOrganization {
            name: req.name,
            slug: req.slug,
            tier: SubscriptionTier::Free,
        },
    )
    .await?;

    Membership::create(
        &state.db,
        CreateMembership {
            organization_id: organization.id,
            user_id: auth.user_id,
            role: MemberRole::Owner,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(organization)))
}

/// List the caller's organizations
pub async fn list_organizations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<MembershipWithOrganization>>> {
    let organizations = Membership::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(organizations))
}

/// List an organization's members
///
/// Requires the `member:read` action, which every role including guest
/// holds.
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberDetail>>> {
    let tenant = state.tenants.resolve(auth.user_id, Some(org_id)).await?;
    require(tenant.role, Action::MemberRead)?;

    let members = Membership::list_members(&state.db, org_id).await?;
    Ok(Json(members))
}

/// Add a member to an organization
///
/// Requires `member:invite`. The target account must already exist; the
/// organization must have seats left under its tier limit.
///
/// # Errors
///
/// - `404 not_found`: no account with that email
/// - `409 member_exists`: the user is already a member
/// - `409 member_limit_reached`: the tier's seat limit is exhausted
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MembershipResponse>)> {
    req.validate().map_err(map_validation_errors)?;

    let tenant = state.tenants.resolve(auth.user_id, Some(org_id)).await?;
    require(tenant.role, Action::MemberInvite)?;

    if tenant.organization.user_count >= tenant.organization.user_limit {
        return Err(ApiError::Conflict {
            code: "member_limit_reached",
            message: "Organization has reached its member limit".to_string(),
        });
    }

    let email = normalize_email(&req.email);
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No account with that email".to_string()))?;

    let membership = Membership::create(
        &state.db,
        CreateMembership {
            organization_id: org_id,
            user_id: user.id,
            role: req.role,
        },
    )
    .await?;

    Organization::adjust_user_count(&state.db, org_id, 1).await?;

    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse {
            organization_id: membership.organization_id,
            user_id: membership.user_id,
            role: membership.role,
        }),
    ))
}

/// Change a member's role
///
/// Requires `member:manage`.
///
/// # Errors
///
/// - `404 member_not_found`: the target is not a member
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let tenant = state.tenants.resolve(auth.user_id, Some(org_id)).await?;
    require(tenant.role, Action::MemberManage)?;

    let membership = Membership::update_role(&state.db, org_id, user_id, req.role)
        .await?
        .ok_or(ApiError::MemberNotFound)?;

    Ok(Json(MembershipResponse {
        organization_id: membership.organization_id,
        user_id: membership.user_id,
        role: membership.role,
    }))
}

/// Remove a member
///
/// Requires `member:remove`.
///
/// # Errors
///
/// - `404 member_not_found`: the target is not a member
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let tenant = state.tenants.resolve(auth.user_id, Some(org_id)).await?;
    require(tenant.role, Action::MemberRemove)?;

    let removed = Membership::delete(&state.db, org_id, user_id).await?;
    if !removed {
        return Err(ApiError::MemberNotFound);
    }

    Organization::adjust_user_count(&state.db, org_id, -1).await?;

    Ok(Json(MessageResponse {
        message: "Member removed".to_string(),
    }))
}

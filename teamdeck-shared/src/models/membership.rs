/// Membership model and database operations
///
/// Memberships bind a user to an organization with exactly one role. The
/// composite primary key enforces the one-role-per-organization invariant.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('owner', 'admin', 'member', 'guest');
///
/// CREATE TABLE memberships (
///     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (organization_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: full control, billing, delete organization
/// - **admin**: manage members, projects, and settings
/// - **member**: create and work on projects and tasks
/// - **guest**: read-only access
///
/// Role names carry no implicit hierarchy here; what each role may do is
/// enumerated per action in [`crate::auth::permission`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Role a user holds within one organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Full control including billing and organization deletion
    Owner,

    /// Member and project management
    Admin,

    /// Day-to-day project and task work
    Member,

    /// Read-only access
    Guest,
}

impl MemberRole {
    /// Converts the role to its storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
            MemberRole::Guest => "guest",
        }
    }

    /// Parses a role from its storage representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(MemberRole::Owner),
            "admin" => Some(MemberRole::Admin),
            "member" => Some(MemberRole::Member),
            "guest" => Some(MemberRole::Guest),
            _ => None,
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership row binding a user to an organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the organization
    pub role: MemberRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: MemberRole,
}

fn default_role() -> MemberRole {
    MemberRole::Member
}

/// A user's membership joined with its organization
///
/// Returned when listing the organizations a user belongs to, so the
/// session layer can pick a default tenant and clients can render a
/// workspace switcher.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MembershipWithOrganization {
    /// Organization ID
    pub organization_id: Uuid,

    /// Organization display name
    pub name: String,

    /// Organization slug
    pub slug: String,

    /// Subscription status of the organization
    pub subscription_status: String,

    /// The user's role within that organization
    pub role: MemberRole,

    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

/// A membership joined with the member's user record
///
/// Returned when listing an organization's members.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberDetail {
    /// User ID
    pub user_id: Uuid,

    /// Member email
    pub email: String,

    /// Member display name
    pub name: Option<String>,

    /// Role within the organization
    pub role: MemberRole,

    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Creates a new membership (adds a user to an organization)
    ///
    /// # Errors
    ///
    /// Returns an error if the membership already exists (primary-key
    /// violation), the organization or user is missing (foreign-key
    /// violation), or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (organization_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING organization_id, user_id, role, created_at
            "#,
        )
        .bind(data.organization_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds a specific membership
    pub async fn find(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT organization_id, user_id, role, created_at
            FROM memberships
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Gets a user's role in an organization
    ///
    /// # Returns
    ///
    /// The role if the user is a member, None otherwise
    pub async fn get_role(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MemberRole>, sqlx::Error> {
        let role: Option<MemberRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM memberships
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Updates a member's role
    ///
    /// # Returns
    ///
    /// The updated membership if found, None if the membership doesn't exist
    pub async fn update_role(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $3
            WHERE organization_id = $1 AND user_id = $2
            RETURNING organization_id, user_id, role, created_at
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Deletes a membership (removes a user from an organization)
    ///
    /// # Returns
    ///
    /// True if a membership was deleted, false if it didn't exist
    pub async fn delete(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM memberships WHERE organization_id = $1 AND user_id = $2")
                .bind(organization_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists an organization's members with their user details
    pub async fn list_members(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<MemberDetail>, sqlx::Error> {
        let members = sqlx::query_as::<_, MemberDetail>(
            r#"
            SELECT m.user_id, u.email, u.name, m.role, m.created_at AS joined_at
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Lists the organizations a user belongs to, oldest membership first
    ///
    /// The first entry is the user's default organization for token claims.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<MembershipWithOrganization>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, MembershipWithOrganization>(
            r#"
            SELECT m.organization_id, o.name, o.slug, o.subscription_status,
                   m.role, m.created_at AS joined_at
            FROM memberships m
            JOIN organizations o ON o.id = m.organization_id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Owner.as_str(), "owner");
        assert_eq!(MemberRole::Admin.as_str(), "admin");
        assert_eq!(MemberRole::Member.as_str(), "member");
        assert_eq!(MemberRole::Guest.as_str(), "guest");
    }

    #[test]
    fn test_member_role_roundtrip() {
        for role in [
            MemberRole::Owner,
            MemberRole::Admin,
            MemberRole::Member,
            MemberRole::Guest,
        ] {
            assert_eq!(MemberRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(MemberRole::from_str("viewer"), None);
    }

    #[test]
    fn test_member_role_display() {
        assert_eq!(MemberRole::Guest.to_string(), "guest");
    }

    #[test]
    fn test_create_membership_default_role() {
        assert_eq!(default_role(), MemberRole::Member);
    }

    // Integration tests for database operations require PostgreSQL and live
    // in tests/ at the crate root.
}

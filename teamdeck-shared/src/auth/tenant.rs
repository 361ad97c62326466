/// Tenant resolution
///
/// Every tenant-scoped operation passes through here before any permission
/// check: the caller must name an organization, must hold a membership in
/// it, and the organization's subscription must be active. A suspended
/// tenant blocks all member actions, not just billing actions.
///
/// # Example
///
/// ```no_run
/// use teamdeck_shared::auth::tenant::TenantResolver;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, org_id: Uuid) -> anyhow::Result<()> {
/// let resolver = TenantResolver::new(pool);
/// let tenant = resolver.resolve(user_id, Some(org_id)).await?;
/// println!("caller is a {} of {}", tenant.role, tenant.organization.name);
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{MemberRole, Membership};
use crate::models::organization::Organization;

/// Error type for tenant resolution
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    /// The caller supplied no organization id
    #[error("organization id is required")]
    OrganizationIdRequired,

    /// No membership row exists for (organization, user)
    #[error("no access to organization {0}")]
    AccessDenied(Uuid),

    /// The organization's subscription is not active
    #[error("organization {0} is not active")]
    Inactive(Uuid),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A successfully resolved tenant context
#[derive(Debug, Clone)]
pub struct ResolvedTenant {
    /// The target organization
    pub organization: Organization,

    /// The caller's role within it
    pub role: MemberRole,
}

/// Resolves tenant membership for authenticated callers
///
/// Holds a dependency-injected pool; constructed once at startup and
/// cloned into request state.
#[derive(Clone)]
pub struct TenantResolver {
    db: PgPool,
}

impl TenantResolver {
    /// Creates a new resolver over the given pool
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolves the caller's role in the requested organization
    ///
    /// Check order: the organization id must be present, the membership
    /// must exist, and the subscription must be active. An organization
    /// that no longer exists resolves to `AccessDenied` rather than
    /// leaking whether the id was ever valid.
    ///
    /// # Errors
    ///
    /// - `TenantError::OrganizationIdRequired` - no organization supplied
    /// - `TenantError::AccessDenied` - caller is not a member
    /// - `TenantError::Inactive` - subscription status is not active
    pub async fn resolve(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<ResolvedTenant, TenantError> {
        let org_id = organization_id.ok_or(TenantError::OrganizationIdRequired)?;

        let role = Membership::get_role(&self.db, org_id, user_id)
            .await?
            .ok_or(TenantError::AccessDenied(org_id))?;

        let organization = Organization::find_by_id(&self.db, org_id)
            .await?
            .ok_or(TenantError::AccessDenied(org_id))?;

        if !organization.is_active() {
            return Err(TenantError::Inactive(org_id));
        }

        Ok(ResolvedTenant { organization, role })
    }
}

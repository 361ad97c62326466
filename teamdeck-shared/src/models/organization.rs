/// Organization model and database operations
///
/// Organizations are the tenant boundary: every project and task belongs to
/// exactly one organization, and all tenant-scoped requests are resolved
/// against a membership in the target organization.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(255) NOT NULL UNIQUE,
///     subscription_tier VARCHAR(50) NOT NULL DEFAULT 'free',
///     subscription_status VARCHAR(50) NOT NULL DEFAULT 'active',
///     user_count INTEGER NOT NULL DEFAULT 1,
///     project_count INTEGER NOT NULL DEFAULT 0,
///     storage_used_mb BIGINT NOT NULL DEFAULT 0,
///     user_limit INTEGER NOT NULL,
///     project_limit INTEGER NOT NULL,
///     storage_limit_mb BIGINT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT organizations_tier_check CHECK (
///         subscription_tier IN ('free', 'starter', 'pro', 'enterprise')
///     ),
///     CONSTRAINT organizations_status_check CHECK (
///         subscription_status IN ('active', 'past_due', 'canceled')
///     )
/// );
/// ```
///
/// A suspended subscription (`past_due`, `canceled`) blocks every member
/// action against the tenant, not just billing actions; the tenant resolver
/// enforces that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Subscription tiers
///
/// Tiers determine the usage limits stamped onto an organization at
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// Free tier (small teams, evaluation)
    Free,

    /// Starter tier
    Starter,

    /// Professional tier
    Pro,

    /// Enterprise tier (custom contracts)
    Enterprise,
}

impl SubscriptionTier {
    /// Converts the tier to its storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Starter => "starter",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }

    /// Parses a tier from its storage representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(SubscriptionTier::Free),
            "starter" => Some(SubscriptionTier::Starter),
            "pro" => Some(SubscriptionTier::Pro),
            "enterprise" => Some(SubscriptionTier::Enterprise),
            _ => None,
        }
    }

    /// Usage limits granted by this tier: (users, projects, storage MB)
    pub fn limits(&self) -> (i32, i32, i64) {
        match self {
            SubscriptionTier::Free => (5, 3, 512),
            SubscriptionTier::Starter => (25, 25, 10 * 1024),
            SubscriptionTier::Pro => (100, 200, 100 * 1024),
            SubscriptionTier::Enterprise => (1000, 1000, 1024 * 1024),
        }
    }
}

/// Subscription lifecycle state
///
/// Only `Active` organizations accept tenant-scoped operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// In good standing; members can operate normally
    Active,

    /// Payment failed; the tenant is frozen until billing recovers
    PastDue,

    /// Subscription terminated
    Canceled,
}

impl SubscriptionStatus {
    /// Converts the status to its storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Parses a status from its storage representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }
}

/// Organization model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// URL-safe identifier, globally unique
    pub slug: String,

    /// Current subscription tier
    pub subscription_tier: String,

    /// Current subscription status
    pub subscription_status: String,

    /// Number of members
    pub user_count: i32,

    /// Number of projects
    pub project_count: i32,

    /// Storage consumed, in megabytes
    pub storage_used_mb: i64,

    /// Member limit for the current tier
    pub user_limit: i32,

    /// Project limit for the current tier
    pub project_limit: i32,

    /// Storage limit for the current tier, in megabytes
    pub storage_limit_mb: i64,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Gets the parsed subscription tier
    pub fn tier(&self) -> Option<SubscriptionTier> {
        SubscriptionTier::from_str(&self.subscription_tier)
    }

    /// Gets the parsed subscription status
    pub fn status(&self) -> Option<SubscriptionStatus> {
        SubscriptionStatus::from_str(&self.subscription_status)
    }

    /// Whether the subscription currently permits tenant operations
    pub fn is_active(&self) -> bool {
        matches!(self.status(), Some(SubscriptionStatus::Active))
    }
}

/// Input for creating a new organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// Display name
    pub name: String,

    /// Explicit slug; generated from the name when absent
    pub slug: Option<String>,

    /// Initial subscription tier (defaults to Free)
    #[serde(default = "default_tier")]
    pub tier: SubscriptionTier,
}

fn default_tier() -> SubscriptionTier {
    SubscriptionTier::Free
}

/// Derives a URL-safe slug from an organization name
///
/// Lowercases, maps runs of non-alphanumeric characters to single dashes,
/// and strips leading/trailing dashes.
///
/// # Example
///
/// ```
/// use teamdeck_shared::models::organization::slugify;
///
/// assert_eq!(slugify("Acme Corp"), "acme-corp");
/// assert_eq!(slugify("  Design & Research!  "), "design-research");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .constraint()
            .map(|c| c.contains(constraint))
            .unwrap_or(false),
        _ => false,
    }
}

impl Organization {
    /// Creates a new organization
    ///
    /// Usage limits are stamped from the tier at creation time. When no
    /// slug is supplied one is derived from the name; a collision on a
    /// derived slug is retried once with a random suffix, while a collision
    /// on an explicitly supplied slug is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns the underlying unique-violation error when the slug is
    /// already taken, or any other database error.
    pub async fn create(pool: &PgPool, data: CreateOrganization) -> Result<Self, sqlx::Error> {
        let derived = data.slug.is_none();
        let slug = match data.slug {
            Some(s) => s,
            None => slugify(&data.name),
        };

        match Self::insert(pool, &data.name, &slug, data.tier).await {
            Ok(org) => Ok(org),
            Err(e) if derived && is_unique_violation(&e, "slug") => {
                let suffix: String = Uuid::new_v4()
                    .simple()
                    .to_string()
                    .chars()
                    .take(6)
                    .collect();
                let retry_slug = format!("{}-{}", slug, suffix);
                Self::insert(pool, &data.name, &retry_slug, data.tier).await
            }
            Err(e) => Err(e),
        }
    }

    async fn insert(
        pool: &PgPool,
        name: &str,
        slug: &str,
        tier: SubscriptionTier,
    ) -> Result<Self, sqlx::Error> {
        let (user_limit, project_limit, storage_limit_mb) = tier.limits();

        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations
                (name, slug, subscription_tier, user_limit, project_limit, storage_limit_mb)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, slug, subscription_tier, subscription_status,
                      user_count, project_count, storage_used_mb,
                      user_limit, project_limit, storage_limit_mb,
                      created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(tier.as_str())
        .bind(user_limit)
        .bind(project_limit)
        .bind(storage_limit_mb)
        .fetch_one(pool)
        .await
    }

    /// Finds an organization by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, slug, subscription_tier, subscription_status,
                   user_count, project_count, storage_used_mb,
                   user_limit, project_limit, storage_limit_mb,
                   created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Finds an organization by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, slug, subscription_tier, subscription_status,
                   user_count, project_count, storage_used_mb,
                   user_limit, project_limit, storage_limit_mb,
                   created_at, updated_at
            FROM organizations
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Updates the subscription status
    ///
    /// # Returns
    ///
    /// The updated organization if found, None otherwise
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET subscription_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, slug, subscription_tier, subscription_status,
                      user_count, project_count, storage_used_mb,
                      user_limit, project_limit, storage_limit_mb,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Adjusts the member counter by the given delta
    ///
    /// Called when memberships are created or removed; clamped at zero.
    pub async fn adjust_user_count(
        pool: &PgPool,
        id: Uuid,
        delta: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE organizations
            SET user_count = GREATEST(user_count + $2, 0), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(delta)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Deletes an organization
    ///
    /// Cascades to memberships (and all tenant-scoped data) through the
    /// storage layer's referential rules.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

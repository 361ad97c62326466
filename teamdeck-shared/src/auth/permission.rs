/// Static permission table mapping actions to allowed roles
///
/// Every tenant-scoped action has an explicitly enumerated set of roles
/// that may perform it. There is deliberately no role hierarchy being
/// collapsed here: reading is granted to guests while most mutations are
/// not, so "owner ⊇ admin ⊇ member ⊇ guest" would grant the wrong things.
/// The table is data-independent and checked before any mutating operation
/// executes.
///
/// # Example
///
/// ```
/// use teamdeck_shared::auth::permission::{require, Action};
/// use teamdeck_shared::models::membership::MemberRole;
///
/// assert!(require(MemberRole::Guest, Action::ProjectRead).is_ok());
/// assert!(require(MemberRole::Guest, Action::ProjectUpdate).is_err());
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::membership::MemberRole;

/// Error type for permission checks
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    /// The caller's role is not in the action's allowed set
    #[error("role {role} may not perform {action}")]
    Denied {
        /// The attempted action
        action: Action,
        /// The caller's role
        role: MemberRole,
    },
}

/// Tenant-scoped actions subject to the permission table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// View projects
    ProjectRead,
    /// Create a project
    ProjectCreate,
    /// Edit a project
    ProjectUpdate,
    /// Delete a project
    ProjectDelete,

    /// View tasks
    TaskRead,
    /// Create a task
    TaskCreate,
    /// Edit or move a task
    TaskUpdate,
    /// Delete a task
    TaskDelete,

    /// View the member list
    MemberRead,
    /// Invite a user into the organization
    MemberInvite,
    /// Change a member's role
    MemberManage,
    /// Remove a member
    MemberRemove,

    /// Edit organization settings
    OrgUpdate,
    /// Delete the organization
    OrgDelete,

    /// Manage the subscription and payment details
    BillingManage,
}

impl Action {
    /// Returns the action name in `resource:verb` form
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ProjectRead => "project:read",
            Action::ProjectCreate => "project:create",
            Action::ProjectUpdate => "project:update",
            Action::ProjectDelete => "project:delete",
            Action::TaskRead => "task:read",
            Action::TaskCreate => "task:create",
            Action::TaskUpdate => "task:update",
            Action::TaskDelete => "task:delete",
            Action::MemberRead => "member:read",
            Action::MemberInvite => "member:invite",
            Action::MemberManage => "member:manage",
            Action::MemberRemove => "member:remove",
            Action::OrgUpdate => "org:update",
            Action::OrgDelete => "org:delete",
            Action::BillingManage => "billing:manage",
        }
    }

    /// Parses an action from its `resource:verb` form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "project:read" => Some(Action::ProjectRead),
            "project:create" => Some(Action::ProjectCreate),
            "project:update" => Some(Action::ProjectUpdate),
            "project:delete" => Some(Action::ProjectDelete),
            "task:read" => Some(Action::TaskRead),
            "task:create" => Some(Action::TaskCreate),
            "task:update" => Some(Action::TaskUpdate),
            "task:delete" => Some(Action::TaskDelete),
            "member:read" => Some(Action::MemberRead),
            "member:invite" => Some(Action::MemberInvite),
            "member:manage" => Some(Action::MemberManage),
            "member:remove" => Some(Action::MemberRemove),
            "org:update" => Some(Action::OrgUpdate),
            "org:delete" => Some(Action::OrgDelete),
            "billing:manage" => Some(Action::BillingManage),
            _ => None,
        }
    }

    /// Returns every action, for exhaustive tests and introspection
    pub fn all() -> &'static [Action] {
        &[
            Action::ProjectRead,
            Action::ProjectCreate,
            Action::ProjectUpdate,
            Action::ProjectDelete,
            Action::TaskRead,
            Action::TaskCreate,
            Action::TaskUpdate,
            Action::TaskDelete,
            Action::MemberRead,
            Action::MemberInvite,
            Action::MemberManage,
            Action::MemberRemove,
            Action::OrgUpdate,
            Action::OrgDelete,
            Action::BillingManage,
        ]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALL_ROLES: &[MemberRole] = &[
    MemberRole::Owner,
    MemberRole::Admin,
    MemberRole::Member,
    MemberRole::Guest,
];

const WRITERS: &[MemberRole] = &[MemberRole::Owner, MemberRole::Admin, MemberRole::Member];

const ADMINS: &[MemberRole] = &[MemberRole::Owner, MemberRole::Admin];

const OWNER_ONLY: &[MemberRole] = &[MemberRole::Owner];

/// The permission table
///
/// The match is exhaustive over [`Action`], so adding an action without
/// deciding its allowed roles fails to compile.
pub fn allowed_roles(action: Action) -> &'static [MemberRole] {
    match action {
        Action::ProjectRead => ALL_ROLES,
        Action::ProjectCreate => WRITERS,
        Action::ProjectUpdate => WRITERS,
        Action::ProjectDelete => ADMINS,

        Action::TaskRead => ALL_ROLES,
        Action::TaskCreate => WRITERS,
        Action::TaskUpdate => WRITERS,
        Action::TaskDelete => WRITERS,

        Action::MemberRead => ALL_ROLES,
        Action::MemberInvite => ADMINS,
        Action::MemberManage => ADMINS,
        Action::MemberRemove => ADMINS,

        Action::OrgUpdate => ADMINS,
        Action::OrgDelete => OWNER_ONLY,

        Action::BillingManage => OWNER_ONLY,
    }
}

/// Checks whether a role may perform an action
pub fn is_allowed(role: MemberRole, action: Action) -> bool {
    allowed_roles(action).contains(&role)
}

/// Requires that a role may perform an action
///
/// # Errors
///
/// Returns `PermissionError::Denied` when the role is not in the action's
/// allowed set
pub fn require(role: MemberRole, action: Action) -> Result<(), PermissionError> {
    if is_allowed(role, action) {
        Ok(())
    } else {
        Err(PermissionError::Denied { action, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_str_roundtrip() {
        for action in Action::all() {
            assert_eq!(Action::parse(action.as_str()), Some(*action));
        }
        assert_eq!(Action::parse("project:explode"), None);
    }

    #[test]
    fn test_every_action_has_an_owner() {
        // Owners appear in every allowed set, but only because each set
        // lists them explicitly
        for action in Action::all() {
            assert!(
                is_allowed(MemberRole::Owner, *action),
                "owner should be allowed {}",
                action
            );
        }
    }

    #[test]
    fn test_guest_permissions_enumerated() {
        // Guests hold exactly the read actions; each permission is checked
        // independently rather than assuming role order implies permission
        // order
        assert!(is_allowed(MemberRole::Guest, Action::ProjectRead));
        assert!(is_allowed(MemberRole::Guest, Action::TaskRead));
        assert!(is_allowed(MemberRole::Guest, Action::MemberRead));

        assert!(!is_allowed(MemberRole::Guest, Action::ProjectCreate));
        assert!(!is_allowed(MemberRole::Guest, Action::ProjectUpdate));
        assert!(!is_allowed(MemberRole::Guest, Action::ProjectDelete));
        assert!(!is_allowed(MemberRole::Guest, Action::TaskCreate));
        assert!(!is_allowed(MemberRole::Guest, Action::TaskUpdate));
        assert!(!is_allowed(MemberRole::Guest, Action::TaskDelete));
        assert!(!is_allowed(MemberRole::Guest, Action::MemberInvite));
        assert!(!is_allowed(MemberRole::Guest, Action::MemberManage));
        assert!(!is_allowed(MemberRole::Guest, Action::MemberRemove));
        assert!(!is_allowed(MemberRole::Guest, Action::OrgUpdate));
        assert!(!is_allowed(MemberRole::Guest, Action::OrgDelete));
        assert!(!is_allowed(MemberRole::Guest, Action::BillingManage));
    }

    #[test]
    fn test_member_permissions_enumerated() {
        assert!(is_allowed(MemberRole::Member, Action::ProjectRead));
        assert!(is_allowed(MemberRole::Member, Action::ProjectCreate));
        assert!(is_allowed(MemberRole::Member, Action::ProjectUpdate));
        assert!(is_allowed(MemberRole::Member, Action::TaskRead));
        assert!(is_allowed(MemberRole::Member, Action::TaskCreate));
        assert!(is_allowed(MemberRole::Member, Action::TaskUpdate));
        assert!(is_allowed(MemberRole::Member, Action::TaskDelete));
        assert!(is_allowed(MemberRole::Member, Action::MemberRead));

        assert!(!is_allowed(MemberRole::Member, Action::ProjectDelete));
        assert!(!is_allowed(MemberRole::Member, Action::MemberInvite));
        assert!(!is_allowed(MemberRole::Member, Action::MemberManage));
        assert!(!is_allowed(MemberRole::Member, Action::MemberRemove));
        assert!(!is_allowed(MemberRole::Member, Action::OrgUpdate));
        assert!(!is_allowed(MemberRole::Member, Action::OrgDelete));
        assert!(!is_allowed(MemberRole::Member, Action::BillingManage));
    }

    #[test]
    fn test_admin_permissions_enumerated() {
        assert!(is_allowed(MemberRole::Admin, Action::ProjectDelete));
        assert!(is_allowed(MemberRole::Admin, Action::MemberInvite));
        assert!(is_allowed(MemberRole::Admin, Action::MemberManage));
        assert!(is_allowed(MemberRole::Admin, Action::MemberRemove));
        assert!(is_allowed(MemberRole::Admin, Action::OrgUpdate));

        assert!(!is_allowed(MemberRole::Admin, Action::OrgDelete));
        assert!(!is_allowed(MemberRole::Admin, Action::BillingManage));
    }

    #[test]
    fn test_owner_exclusive_actions() {
        assert!(is_allowed(MemberRole::Owner, Action::OrgDelete));
        assert!(is_allowed(MemberRole::Owner, Action::BillingManage));

        for role in [MemberRole::Admin, MemberRole::Member, MemberRole::Guest] {
            assert!(!is_allowed(role, Action::OrgDelete));
            assert!(!is_allowed(role, Action::BillingManage));
        }
    }

    #[test]
    fn test_require_denied_error() {
        let err = require(MemberRole::Guest, Action::TaskDelete).unwrap_err();
        let PermissionError::Denied { action, role } = err;
        assert_eq!(action, Action::TaskDelete);
        assert_eq!(role, MemberRole::Guest);
    }

    #[test]
    fn test_denied_error_display() {
        let err = require(MemberRole::Guest, Action::ProjectDelete).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("guest"));
        assert!(msg.contains("project:delete"));
    }
}

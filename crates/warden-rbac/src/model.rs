// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Roles, permissions and effective permission sets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use warden_core::{PermissionId, RoleId, UserId};

/// Well-known `user` role.
pub const USER_ROLE_ID: RoleId = RoleId::new(1);
/// Well-known `admin` role.
pub const ADMIN_ROLE_ID: RoleId = RoleId::new(2);
/// Well-known `moderator` role.
pub const MODERATOR_ROLE_ID: RoleId = RoleId::new(3);
/// Permission granted to the seeded `admin` role.
pub const ALL_ACCESS_PERMISSION_ID: PermissionId = PermissionId::new(1);

// =============================================================================
// Status
// =============================================================================

/// Whether a role or permission currently takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Contributes to effective permission sets.
    #[default]
    Active,
    /// Ignored when computing effective permission sets.
    Inactive,
}

impl Status {
    /// Returns `true` for [`Status::Active`].
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Active)
    }
}

// =============================================================================
// Role
// =============================================================================

/// A named group of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Role name.
    pub name: String,
    /// Role status.
    #[serde(default)]
    pub status: Status,
}

impl Role {
    /// Creates an active role.
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: Status::Active,
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Returns `true` if the role is active.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// =============================================================================
// Permission
// =============================================================================

/// Permission to perform actions matching `action` on resources matching `resource`.
///
/// A pattern of `*` or `/*` matches any value. Any other pattern matches
/// only the identical string; there is no prefix or regex matching and
/// comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Permission identifier.
    pub id: PermissionId,
    /// Permission name.
    pub name: String,
    /// Resource pattern.
    pub resource: String,
    /// Action pattern.
    pub action: String,
    /// Permission status.
    #[serde(default)]
    pub status: Status,
}

impl Permission {
    /// Creates an active permission.
    pub fn new(
        id: PermissionId,
        name: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            resource: resource.into(),
            action: action.into(),
            status: Status::Active,
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Returns `true` if the permission is active.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns `true` if this permission covers `action` on `resource`.
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        resource_matches(&self.resource, resource) && action_matches(&self.action, action)
    }
}

/// Resource pattern match: `*` and `/*` match any resource, anything else
/// only itself.
pub fn resource_matches(pattern: &str, resource: &str) -> bool {
    matches!(pattern, "*" | "/*") || pattern == resource
}

/// Action pattern match: `*` matches any action, anything else only itself.
pub fn action_matches(pattern: &str, action: &str) -> bool {
    pattern == "*" || pattern == action
}

// =============================================================================
// EffectivePermissions
// =============================================================================

/// The permissions a user holds through active role memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    /// The user this set was computed for.
    pub user_id: UserId,
    /// Active roles held by the user.
    pub roles: BTreeSet<RoleId>,
    /// Active permissions granted through those roles.
    pub permissions: BTreeMap<PermissionId, Permission>,
    /// Store revision the set was computed at.
    pub revision: u64,
}

impl EffectivePermissions {
    /// Creates an empty set for `user_id`.
    pub fn empty(user_id: UserId, revision: u64) -> Self {
        Self {
            user_id,
            roles: BTreeSet::new(),
            permissions: BTreeMap::new(),
            revision,
        }
    }

    /// Returns `true` if any permission covers `action` on `resource`.
    pub fn allows(&self, resource: &str, action: &str) -> bool {
        self.permissions
            .values()
            .any(|permission| permission.matches(resource, action))
    }

    /// Returns `true` if the user holds `role_id` as an active role.
    pub fn has_role(&self, role_id: RoleId) -> bool {
        self.roles.contains(&role_id)
    }

    /// Returns `true` if the set grants nothing.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

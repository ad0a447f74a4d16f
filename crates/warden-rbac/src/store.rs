// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role/permission store.
//!
//! Holds roles, permissions, role→permission grants and user→role
//! assignments behind one reader/writer lock. Every mutation that changes
//! state bumps a store-wide revision while the write lock is held, and
//! returns the [`Invalidation`] the resolver cache must apply.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_core::{AccessError, PermissionId, RoleId, UserId};

use crate::model::{
    EffectivePermissions, Permission, Role, Status, ADMIN_ROLE_ID, ALL_ACCESS_PERMISSION_ID,
    MODERATOR_ROLE_ID, USER_ROLE_ID,
};

/// Result type for store operations.
pub type AccessResult<T> = Result<T, AccessError>;

// =============================================================================
// Invalidation
// =============================================================================

/// Cached effective permission sets a mutation has made stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Nothing changed.
    None,
    /// Only this user's set is stale.
    User(UserId),
    /// Any user's set may be stale.
    All,
}

// =============================================================================
// RbacSnapshot
// =============================================================================

/// A role→permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Grant {
    /// Granting role.
    pub role_id: RoleId,
    /// Granted permission.
    pub permission_id: PermissionId,
}

/// A user→role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
}

/// Persisted form of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacSnapshot {
    /// All roles.
    pub roles: Vec<Role>,
    /// All permissions.
    pub permissions: Vec<Permission>,
    /// Role→permission grants.
    pub grants: Vec<Grant>,
    /// User→role assignments.
    pub assignments: Vec<Assignment>,
}

// =============================================================================
// RoleStore
// =============================================================================

#[derive(Debug, Default)]
struct Inner {
    roles: BTreeMap<RoleId, Role>,
    permissions: BTreeMap<PermissionId, Permission>,
    grants: HashMap<RoleId, BTreeSet<PermissionId>>,
    assignments: HashMap<UserId, BTreeSet<RoleId>>,
}

impl Inner {
    fn require_role(&self, role_id: RoleId) -> AccessResult<()> {
        if self.roles.contains_key(&role_id) {
            Ok(())
        } else {
            Err(AccessError::RoleNotFound { role_id })
        }
    }

    fn require_permission(&self, permission_id: PermissionId) -> AccessResult<()> {
        if self.permissions.contains_key(&permission_id) {
            Ok(())
        } else {
            Err(AccessError::PermissionNotFound { permission_id })
        }
    }
}

/// Many-to-many relations between users, roles and permissions.
#[derive(Debug, Default)]
pub struct RoleStore {
    inner: RwLock<Inner>,
    revision: AtomicU64,
}

impl RoleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the well-known roles.
    ///
    /// `user` (1), `admin` (2) holding a `/*` + `*` permission, and
    /// `moderator` (3).
    pub fn with_defaults() -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for (id, name) in [
                (USER_ROLE_ID, "user"),
                (ADMIN_ROLE_ID, "admin"),
                (MODERATOR_ROLE_ID, "moderator"),
            ] {
                inner.roles.insert(id, Role::new(id, name));
            }
            inner.permissions.insert(
                ALL_ACCESS_PERMISSION_ID,
                Permission::new(ALL_ACCESS_PERMISSION_ID, "all_access", "/*", "*"),
            );
            inner
                .grants
                .entry(ADMIN_ROLE_ID)
                .or_default()
                .insert(ALL_ACCESS_PERMISSION_ID);
        }
        store
    }

    /// Builds a store from a snapshot, checking every reference.
    pub fn from_snapshot(snapshot: RbacSnapshot) -> AccessResult<Self> {
        let mut inner = Inner::default();

        for role in snapshot.roles {
            if inner.roles.contains_key(&role.id) {
                return Err(AccessError::AlreadyExists {
                    entity: "role",
                    id: role.id.get(),
                });
            }
            inner.roles.insert(role.id, role);
        }
        for permission in snapshot.permissions {
            if inner.permissions.contains_key(&permission.id) {
                return Err(AccessError::AlreadyExists {
                    entity: "permission",
                    id: permission.id.get(),
                });
            }
            inner.permissions.insert(permission.id, permission);
        }
        for grant in snapshot.grants {
            inner.require_role(grant.role_id)?;
            inner.require_permission(grant.permission_id)?;
            inner
                .grants
                .entry(grant.role_id)
                .or_default()
                .insert(grant.permission_id);
        }
        for assignment in snapshot.assignments {
            inner.require_role(assignment.role_id)?;
            inner
                .assignments
                .entry(assignment.user_id)
                .or_default()
                .insert(assignment.role_id);
        }

        Ok(Self {
            inner: RwLock::new(inner),
            revision: AtomicU64::new(0),
        })
    }

    /// Exports the current state.
    pub fn snapshot(&self) -> RbacSnapshot {
        let inner = self.inner.read();

        let mut grants: Vec<Grant> = inner
            .grants
            .iter()
            .flat_map(|(role_id, permissions)| {
                permissions.iter().map(move |permission_id| Grant {
                    role_id: *role_id,
                    permission_id: *permission_id,
                })
            })
            .collect();
        grants.sort();

        let mut assignments: Vec<Assignment> = inner
            .assignments
            .iter()
            .flat_map(|(user_id, roles)| {
                roles.iter().map(move |role_id| Assignment {
                    user_id: *user_id,
                    role_id: *role_id,
                })
            })
            .collect();
        assignments.sort();

        RbacSnapshot {
            roles: inner.roles.values().cloned().collect(),
            permissions: inner.permissions.values().cloned().collect(),
            grants,
            assignments,
        }
    }

    /// Returns the current revision.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Bumps the revision. Must be called with the write lock held.
    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Registers a new role.
    pub fn add_role(&self, role: Role) -> AccessResult<Invalidation> {
        let mut inner = self.inner.write();
        if inner.roles.contains_key(&role.id) {
            return Err(AccessError::AlreadyExists {
                entity: "role",
                id: role.id.get(),
            });
        }
        debug!(role_id = %role.id, name = %role.name, "Role added");
        inner.roles.insert(role.id, role);
        self.bump();
        // Nobody holds a new role yet.
        Ok(Invalidation::None)
    }

    /// Registers a new permission.
    pub fn add_permission(&self, permission: Permission) -> AccessResult<Invalidation> {
        let mut inner = self.inner.write();
        if inner.permissions.contains_key(&permission.id) {
            return Err(AccessError::AlreadyExists {
                entity: "permission",
                id: permission.id.get(),
            });
        }
        debug!(permission_id = %permission.id, name = %permission.name, "Permission added");
        inner.permissions.insert(permission.id, permission);
        self.bump();
        Ok(Invalidation::None)
    }

    /// Grants a permission to every holder of a role.
    pub fn grant_permission_to_role(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AccessResult<Invalidation> {
        let mut inner = self.inner.write();
        inner.require_role(role_id)?;
        inner.require_permission(permission_id)?;

        if !inner.grants.entry(role_id).or_default().insert(permission_id) {
            return Ok(Invalidation::None);
        }
        self.bump();
        debug!(role_id = %role_id, permission_id = %permission_id, "Permission granted");
        Ok(Invalidation::All)
    }

    /// Withdraws a permission from a role.
    pub fn revoke_permission_from_role(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AccessResult<Invalidation> {
        let mut inner = self.inner.write();
        inner.require_role(role_id)?;
        inner.require_permission(permission_id)?;

        let removed = inner
            .grants
            .get_mut(&role_id)
            .is_some_and(|permissions| permissions.remove(&permission_id));
        if !removed {
            return Ok(Invalidation::None);
        }
        self.bump();
        debug!(role_id = %role_id, permission_id = %permission_id, "Permission withdrawn");
        Ok(Invalidation::All)
    }

    /// Activates or deactivates a role.
    pub fn set_role_status(&self, role_id: RoleId, status: Status) -> AccessResult<Invalidation> {
        let mut inner = self.inner.write();
        let role = inner
            .roles
            .get_mut(&role_id)
            .ok_or(AccessError::RoleNotFound { role_id })?;
        if role.status == status {
            return Ok(Invalidation::None);
        }
        role.status = status;
        self.bump();
        Ok(Invalidation::All)
    }

    /// Activates or deactivates a permission.
    pub fn set_permission_status(
        &self,
        permission_id: PermissionId,
        status: Status,
    ) -> AccessResult<Invalidation> {
        let mut inner = self.inner.write();
        let permission = inner
            .permissions
            .get_mut(&permission_id)
            .ok_or(AccessError::PermissionNotFound { permission_id })?;
        if permission.status == status {
            return Ok(Invalidation::None);
        }
        permission.status = status;
        self.bump();
        Ok(Invalidation::All)
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    /// Assigns a role to a user. Assigning a held role is a no-op.
    pub fn assign_role(&self, user_id: UserId, role_id: RoleId) -> AccessResult<Invalidation> {
        let mut inner = self.inner.write();
        inner.require_role(role_id)?;

        if !inner.assignments.entry(user_id).or_default().insert(role_id) {
            return Ok(Invalidation::None);
        }
        self.bump();
        debug!(user_id = %user_id, role_id = %role_id, "Role assigned");
        Ok(Invalidation::User(user_id))
    }

    /// Removes a role from a user. Removing a role not held is a no-op.
    pub fn remove_role(&self, user_id: UserId, role_id: RoleId) -> AccessResult<Invalidation> {
        let mut inner = self.inner.write();
        inner.require_role(role_id)?;

        let removed = match inner.assignments.get_mut(&user_id) {
            Some(roles) => {
                let removed = roles.remove(&role_id);
                if roles.is_empty() {
                    inner.assignments.remove(&user_id);
                }
                removed
            }
            None => false,
        };
        if !removed {
            return Ok(Invalidation::None);
        }
        self.bump();
        debug!(user_id = %user_id, role_id = %role_id, "Role removed");
        Ok(Invalidation::User(user_id))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns a role by ID.
    pub fn role(&self, role_id: RoleId) -> Option<Role> {
        self.inner.read().roles.get(&role_id).cloned()
    }

    /// Returns a role by name.
    pub fn role_by_name(&self, name: &str) -> Option<Role> {
        self.inner
            .read()
            .roles
            .values()
            .find(|role| role.name == name)
            .cloned()
    }

    /// Returns a permission by ID.
    pub fn permission(&self, permission_id: PermissionId) -> Option<Permission> {
        self.inner.read().permissions.get(&permission_id).cloned()
    }

    /// Returns every role, active or not.
    pub fn roles(&self) -> Vec<Role> {
        self.inner.read().roles.values().cloned().collect()
    }

    /// Returns the roles assigned to a user, active or not.
    pub fn roles_of(&self, user_id: UserId) -> Vec<Role> {
        let inner = self.inner.read();
        inner
            .assignments
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|role_id| inner.roles.get(role_id).cloned())
            .collect()
    }

    /// Returns the active permissions a user holds through active roles.
    pub fn permissions_of(&self, user_id: UserId) -> Vec<Permission> {
        self.effective_permissions(user_id)
            .permissions
            .into_values()
            .collect()
    }

    /// Computes the user's effective permission set, stamped with the
    /// revision it was computed at.
    pub fn effective_permissions(&self, user_id: UserId) -> EffectivePermissions {
        let inner = self.inner.read();
        // Writers bump under the write lock, so this is consistent with the read.
        let mut effective = EffectivePermissions::empty(user_id, self.revision());

        let active_roles = inner
            .assignments
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter(|role_id| inner.roles.get(*role_id).is_some_and(Role::is_active));

        for role_id in active_roles {
            effective.roles.insert(*role_id);
            for permission_id in inner.grants.get(role_id).into_iter().flatten() {
                if let Some(permission) = inner.permissions.get(permission_id) {
                    if permission.is_active() {
                        effective
                            .permissions
                            .insert(*permission_id, permission.clone());
                    }
                }
            }
        }

        effective
    }
}

// =============================================================================
// Tests
// =============================================================================

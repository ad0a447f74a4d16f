// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authorization resolver with a per-user effective permission cache.
//!
//! A cached set never outlives the grant it reflects. Mutations made through
//! the resolver drop the entries named by the [`Invalidation`] the store
//! returns. Every cached set also carries the store revision it was
//! computed at; a hit at an older revision is recomputed, which covers
//! mutations made on the store directly. A set computed concurrently with a
//! mutation is only cached if its revision is still current on insert.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};
use warden_core::{PermissionId, RoleId, UserId};

use crate::model::{EffectivePermissions, Permission, Role, Status, ADMIN_ROLE_ID, MODERATOR_ROLE_ID};
use crate::store::{AccessResult, Invalidation, RoleStore};

/// Answers has-permission and role-membership queries.
#[derive(Debug)]
pub struct AuthorizationResolver {
    store: Arc<RoleStore>,
    cache: RwLock<HashMap<UserId, Arc<EffectivePermissions>>>,
}

impl AuthorizationResolver {
    /// Creates a resolver over `store`.
    pub fn new(store: Arc<RoleStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<RoleStore> {
        &self.store
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the user's effective permission set, computing it on a miss.
    pub fn effective_permissions(&self, user_id: UserId) -> Arc<EffectivePermissions> {
        if let Some(cached) = self.cache.read().get(&user_id) {
            if cached.revision == self.store.revision() {
                trace!(user_id = %user_id, "Permission cache hit");
                return cached.clone();
            }
            trace!(user_id = %user_id, "Cached permissions out of date");
        }

        let computed = Arc::new(self.store.effective_permissions(user_id));

        let mut cache = self.cache.write();
        if self.store.revision() == computed.revision {
            cache.insert(user_id, computed.clone());
        } else {
            debug!(user_id = %user_id, "Store changed during computation; not caching");
        }
        computed
    }

    /// Returns `true` if the user may perform `action` on `resource`.
    pub fn has_permission(&self, user_id: UserId, resource: &str, action: &str) -> bool {
        self.effective_permissions(user_id).allows(resource, action)
    }

    /// Returns `true` if the user holds the active `admin` role.
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.effective_permissions(user_id).has_role(ADMIN_ROLE_ID)
    }

    /// Returns `true` if the user holds the active `moderator` role.
    pub fn is_moderator(&self, user_id: UserId) -> bool {
        self.effective_permissions(user_id)
            .has_role(MODERATOR_ROLE_ID)
    }

    /// Returns `true` if the user is an admin or a moderator.
    pub fn can_moderate(&self, user_id: UserId) -> bool {
        let effective = self.effective_permissions(user_id);
        effective.has_role(ADMIN_ROLE_ID) || effective.has_role(MODERATOR_ROLE_ID)
    }

    /// Returns the roles assigned to a user.
    pub fn roles_of(&self, user_id: UserId) -> Vec<Role> {
        self.store.roles_of(user_id)
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// Drops the cached set of one user.
    pub fn clear_cache(&self, user_id: UserId) {
        self.cache.write().remove(&user_id);
    }

    /// Drops every cached set.
    pub fn clear_all(&self) {
        self.cache.write().clear();
    }

    /// Returns the users with a cached set.
    pub fn cached_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.cache.read().keys().copied().collect();
        users.sort();
        users
    }

    fn apply(&self, invalidation: Invalidation) {
        match invalidation {
            Invalidation::None => {}
            Invalidation::User(user_id) => self.clear_cache(user_id),
            Invalidation::All => self.clear_all(),
        }
    }

    fn mutate(&self, op: impl FnOnce(&RoleStore) -> AccessResult<Invalidation>) -> AccessResult<()> {
        let invalidation = op(&self.store)?;
        self.apply(invalidation);
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Assigns a role to a user.
    pub fn assign_role(&self, user_id: UserId, role_id: RoleId) -> AccessResult<()> {
        self.mutate(|store| store.assign_role(user_id, role_id))
    }

    /// Removes a role from a user.
    pub fn remove_role(&self, user_id: UserId, role_id: RoleId) -> AccessResult<()> {
        self.mutate(|store| store.remove_role(user_id, role_id))
    }

    /// Registers a new role.
    pub fn add_role(&self, role: Role) -> AccessResult<()> {
        self.mutate(|store| store.add_role(role))
    }

    /// Registers a new permission.
    pub fn add_permission(&self, permission: Permission) -> AccessResult<()> {
        self.mutate(|store| store.add_permission(permission))
    }

    /// Grants a permission to a role. Invalidates every cached set.
    pub fn grant_permission_to_role(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AccessResult<()> {
        self.mutate(|store| store.grant_permission_to_role(role_id, permission_id))
    }

    /// Withdraws a permission from a role. Invalidates every cached set.
    pub fn revoke_permission_from_role(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AccessResult<()> {
        self.mutate(|store| store.revoke_permission_from_role(role_id, permission_id))
    }

    /// Activates or deactivates a role.
    pub fn set_role_status(&self, role_id: RoleId, status: Status) -> AccessResult<()> {
        self.mutate(|store| store.set_role_status(role_id, status))
    }

    /// Activates or deactivates a permission.
    pub fn set_permission_status(
        &self,
        permission_id: PermissionId,
        status: Status,
    ) -> AccessResult<()> {
        self.mutate(|store| store.set_permission_status(permission_id, status))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::AccessError;

    const EDITOR: RoleId = RoleId::new(10);
    const EDIT: PermissionId = PermissionId::new(10);

    fn resolver() -> AuthorizationResolver {
        let resolver = AuthorizationResolver::new(Arc::new(RoleStore::with_defaults()));
        resolver.add_role(Role::new(EDITOR, "editor")).unwrap();
        resolver
            .add_permission(Permission::new(EDIT, "edit_posts", "/posts", "PUT"))
            .unwrap();
        resolver.grant_permission_to_role(EDITOR, EDIT).unwrap();
        resolver
    }

    #[test]
    fn test_admin_has_everything() {
        let resolver = resolver();
        let user = UserId::new(7);
        resolver.assign_role(user, ADMIN_ROLE_ID).unwrap();

        assert!(resolver.is_admin(user));
        assert!(resolver.can_moderate(user));
        assert!(!resolver.is_moderator(user));
        assert!(resolver.has_permission(user, "/anything", "DELETE"));
    }

    #[test]
    fn test_assign_then_remove() {
        let resolver = resolver();
        let user = UserId::new(1);

        assert!(!resolver.has_permission(user, "/posts", "PUT"));
        resolver.assign_role(user, EDITOR).unwrap();
        assert!(resolver.has_permission(user, "/posts", "PUT"));
        assert!(!resolver.has_permission(user, "/posts", "DELETE"));

        resolver.remove_role(user, EDITOR).unwrap();
        assert!(!resolver.has_permission(user, "/posts", "PUT"));
    }

    #[test]
    fn test_cache_populated_and_cleared() {
        let resolver = resolver();
        let user = UserId::new(1);

        resolver.has_permission(user, "/posts", "PUT");
        assert_eq!(resolver.cached_users(), vec![user]);

        resolver.clear_cache(user);
        assert!(resolver.cached_users().is_empty());
    }

    #[test]
    fn test_grant_invalidates_all_holders() {
        let resolver = resolver();
        let (a, b) = (UserId::new(1), UserId::new(2));
        resolver.assign_role(a, EDITOR).unwrap();
        resolver.assign_role(b, EDITOR).unwrap();
        assert!(!resolver.has_permission(a, "/posts", "DELETE"));
        assert!(!resolver.has_permission(b, "/posts", "DELETE"));

        let delete = PermissionId::new(11);
        resolver
            .add_permission(Permission::new(delete, "delete_posts", "/posts", "DELETE"))
            .unwrap();
        resolver.grant_permission_to_role(EDITOR, delete).unwrap();

        assert!(resolver.has_permission(a, "/posts", "DELETE"));
        assert!(resolver.has_permission(b, "/posts", "DELETE"));
    }

    #[test]
    fn test_deactivated_role_takes_effect() {
        let resolver = resolver();
        let user = UserId::new(3);
        resolver.assign_role(user, MODERATOR_ROLE_ID).unwrap();
        assert!(resolver.is_moderator(user));

        resolver
            .set_role_status(MODERATOR_ROLE_ID, Status::Inactive)
            .unwrap();
        assert!(!resolver.is_moderator(user));
        assert!(!resolver.can_moderate(user));
    }

    #[test]
    fn test_stale_computation_not_cached() {
        let resolver = resolver();
        let user = UserId::new(1);

        // A set computed before a mutation must not be cached afterwards.
        let stale = resolver.store().effective_permissions(user);
        resolver.store().assign_role(user, EDITOR).unwrap();
        assert_ne!(stale.revision, resolver.store().revision());

        assert!(resolver.has_permission(user, "/posts", "PUT"));
    }

    #[test]
    fn test_direct_store_mutation_is_not_served_from_cache() {
        let resolver = resolver();
        let user = UserId::new(1);
        resolver.assign_role(user, EDITOR).unwrap();
        assert!(resolver.has_permission(user, "/posts", "PUT"));
        assert_eq!(resolver.cached_users(), vec![user]);

        resolver.store().remove_role(user, EDITOR).unwrap();
        assert!(!resolver.has_permission(user, "/posts", "PUT"));

        resolver.store().assign_role(user, ADMIN_ROLE_ID).unwrap();
        assert!(resolver.is_admin(user));
    }

    #[test]
    fn test_errors_propagate() {
        let resolver = resolver();
        assert_eq!(
            resolver.assign_role(UserId::new(1), RoleId::new(99)),
            Err(AccessError::RoleNotFound {
                role_id: RoleId::new(99)
            })
        );
    }

    #[test]
    fn test_disjoint_users_concurrently() {
        let resolver = Arc::new(resolver());

        std::thread::scope(|scope| {
            for i in 0..8u64 {
                let resolver = resolver.clone();
                scope.spawn(move || {
                    let user = UserId::new(100 + i);
                    for _ in 0..200 {
                        resolver.assign_role(user, EDITOR).unwrap();
                        assert!(resolver.has_permission(user, "/posts", "PUT"));
                        resolver.remove_role(user, EDITOR).unwrap();
                        assert!(!resolver.has_permission(user, "/posts", "PUT"));
                    }
                });
            }
        });
    }
}

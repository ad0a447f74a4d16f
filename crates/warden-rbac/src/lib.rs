// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-rbac
//!
//! Role-based access control for warden.
//!
//! - **Model**: roles, permissions with exact-or-wildcard resource/action
//!   patterns, effective permission sets
//! - **Store** ([`RoleStore`]): user→role and role→permission relations
//! - **Resolver** ([`AuthorizationResolver`]): cached has-permission and
//!   role-membership queries, invalidated on every relevant mutation
//! - **Repository** ([`RbacRepository`]): persisted snapshot contract
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_core::UserId;
//! use warden_rbac::{AuthorizationResolver, RoleStore, ADMIN_ROLE_ID};
//!
//! let resolver = AuthorizationResolver::new(Arc::new(RoleStore::with_defaults()));
//! let user = UserId::new(7);
//!
//! resolver.assign_role(user, ADMIN_ROLE_ID).unwrap();
//! assert!(resolver.is_admin(user));
//! assert!(resolver.has_permission(user, "/anything", "DELETE"));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod model;
pub mod repository;
pub mod resolver;
pub mod store;

pub use model::{
    action_matches, resource_matches, EffectivePermissions, Permission, Role, Status,
    ADMIN_ROLE_ID, ALL_ACCESS_PERMISSION_ID, MODERATOR_ROLE_ID, USER_ROLE_ID,
};
pub use repository::{FileRepository, RbacRepository};
pub use resolver::AuthorizationResolver;
pub use store::{AccessResult, Assignment, Grant, Invalidation, RbacSnapshot, RoleStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

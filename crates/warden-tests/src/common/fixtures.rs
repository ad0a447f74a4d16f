// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built configurations, services and role stores.

use std::sync::Arc;
use std::time::Duration;

use warden_config::{RevocationBackend, WardenConfig};
use warden_core::{PermissionId, RoleId, TokenKind};
use warden_rbac::{AuthorizationResolver, Permission, Role, RoleStore};
use warden_service::AccessService;
use warden_token::{CodecConfig, KeyValueStore, TokenCodec};

use super::mocks::MockKeyValueStore;

// =============================================================================
// Secrets
// =============================================================================

/// Access secret used across tests.
pub const ACCESS_SECRET: &str = "test-access-secret-that-is-long-enough-for-hs256";

/// Refresh secret used across tests.
pub const REFRESH_SECRET: &str = "test-refresh-secret-that-is-long-enough-for-hs256";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration fixtures.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Default configuration with test secrets and the memory backend.
    pub fn default_config() -> WardenConfig {
        WardenConfig::with_secrets(ACCESS_SECRET, REFRESH_SECRET)
    }

    /// Default configuration using `backend`.
    pub fn with_backend(backend: RevocationBackend) -> WardenConfig {
        let mut config = Self::default_config();
        config.revocation.backend = backend;
        config
    }

    /// Configuration with short windows for expiry tests.
    pub fn short_lived() -> WardenConfig {
        let mut config = Self::default_config();
        config.access.ttl = Duration::from_secs(60);
        config.refresh.ttl = Duration::from_secs(120);
        config.sweeper.interval = Duration::from_secs(10);
        config
    }
}

// =============================================================================
// Codecs
// =============================================================================

/// Returns the access codec for `config`.
pub fn access_codec(config: &WardenConfig) -> TokenCodec {
    TokenCodec::new(CodecConfig::from_settings(
        TokenKind::Access,
        &config.access,
        &config.issuer,
    ))
    .expect("valid access codec")
}

/// Returns the refresh codec for `config`.
pub fn refresh_codec(config: &WardenConfig) -> TokenCodec {
    TokenCodec::new(CodecConfig::from_settings(
        TokenKind::Refresh,
        &config.refresh,
        &config.issuer,
    ))
    .expect("valid refresh codec")
}

// =============================================================================
// Services
// =============================================================================

/// Service fixtures.
pub struct ServiceFixtures;

impl ServiceFixtures {
    /// A service over the memory backend.
    pub async fn memory() -> AccessService {
        AccessService::from_config(ConfigFixtures::default_config())
            .await
            .expect("memory service")
    }

    /// A service over `backend` with a fresh mock store, returning both.
    pub async fn with_store(backend: RevocationBackend) -> (AccessService, Arc<MockKeyValueStore>) {
        let store = Arc::new(MockKeyValueStore::new());
        let service = AccessService::builder()
            .config(ConfigFixtures::with_backend(backend))
            .key_value_store(store.clone() as Arc<dyn KeyValueStore>)
            .build()
            .await
            .expect("service with store");
        (service, store)
    }
}

// =============================================================================
// Role/Permission Data
// =============================================================================

/// The `editor` role.
pub const EDITOR_ROLE_ID: RoleId = RoleId::new(10);

/// `PUT /posts`, granted to `editor`.
pub const EDIT_POSTS_ID: PermissionId = PermissionId::new(10);

/// `GET /posts`, granted to `editor` and `viewer`.
pub const READ_POSTS_ID: PermissionId = PermissionId::new(11);

/// The `viewer` role.
pub const VIEWER_ROLE_ID: RoleId = RoleId::new(11);

/// Role store fixtures.
pub struct RbacFixtures;

impl RbacFixtures {
    /// Default roles plus `editor` and `viewer`.
    pub fn store() -> RoleStore {
        let store = RoleStore::with_defaults();
        store.add_role(Role::new(EDITOR_ROLE_ID, "editor")).unwrap();
        store.add_role(Role::new(VIEWER_ROLE_ID, "viewer")).unwrap();
        store
            .add_permission(Permission::new(EDIT_POSTS_ID, "edit_posts", "/posts", "PUT"))
            .unwrap();
        store
            .add_permission(Permission::new(READ_POSTS_ID, "read_posts", "/posts", "GET"))
            .unwrap();
        store
            .grant_permission_to_role(EDITOR_ROLE_ID, EDIT_POSTS_ID)
            .unwrap();
        store
            .grant_permission_to_role(EDITOR_ROLE_ID, READ_POSTS_ID)
            .unwrap();
        store
            .grant_permission_to_role(VIEWER_ROLE_ID, READ_POSTS_ID)
            .unwrap();
        store
    }

    /// A resolver over [`Self::store`].
    pub fn resolver() -> AuthorizationResolver {
        AuthorizationResolver::new(Arc::new(Self::store()))
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The access service facade.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warden_config::WardenConfig;
use warden_core::{AccessError, CredentialError, RoleId, UserId, WardenResult};
use warden_rbac::{AuthorizationResolver, Permission, RbacRepository, Role};
use warden_token::{
    extract_bearer_token, Claims, RequestContext, Sweeper, TokenLifecycle, TokenPair,
    SECURITY_TARGET,
};

use crate::builder::AccessServiceBuilder;

/// Credential lifecycle and authorization behind one handle.
///
/// Constructed once at process start and shared by reference (or `Arc`)
/// with every request handler.
pub struct AccessService {
    pub(crate) config: Arc<WardenConfig>,
    pub(crate) lifecycle: TokenLifecycle,
    pub(crate) resolver: Arc<AuthorizationResolver>,
    pub(crate) repository: Option<Arc<dyn RbacRepository>>,
    pub(crate) sweeper: Sweeper,
    pub(crate) background: Mutex<Option<JoinHandle<()>>>,
}

impl AccessService {
    /// Creates a new service builder.
    pub fn builder() -> AccessServiceBuilder {
        AccessServiceBuilder::new()
    }

    /// Builds a service from configuration alone.
    pub async fn from_config(config: WardenConfig) -> WardenResult<Self> {
        Self::builder().config(config).build().await
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// Returns the token lifecycle manager.
    pub fn lifecycle(&self) -> &TokenLifecycle {
        &self.lifecycle
    }

    /// Returns the authorization resolver.
    pub fn resolver(&self) -> &Arc<AuthorizationResolver> {
        &self.resolver
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Issues a fresh pair for a login or registration.
    pub fn issue(&self, user_id: UserId, name: &str) -> WardenResult<TokenPair> {
        self.lifecycle.issue(user_id, name)
    }

    /// Verifies an access credential.
    pub async fn verify_access(&self, token: &str) -> WardenResult<Claims> {
        self.lifecycle.verify_access(token).await
    }

    /// Verifies a refresh credential.
    pub async fn verify_refresh(&self, token: &str) -> WardenResult<Claims> {
        self.lifecycle.verify_refresh(token).await
    }

    /// Exchanges a refresh credential for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> WardenResult<TokenPair> {
        self.lifecycle.refresh(refresh_token).await
    }

    /// Revokes an access or refresh credential.
    pub async fn revoke(&self, token: &str) -> WardenResult<()> {
        self.lifecycle.revoke(token).await
    }

    /// Ends the user's session.
    pub fn revoke_all_for_user(&self, user_id: UserId) {
        self.lifecycle.revoke_all_for_user(user_id)
    }

    /// Blacklists a known access token identifier through its expiry second.
    pub async fn blacklist(&self, claims: &Claims) -> WardenResult<()> {
        match claims.expires_at() {
            Some(until) => self.lifecycle.blacklist(&claims.jti, until).await,
            None => Ok(()),
        }
    }

    // =========================================================================
    // Request Guards
    // =========================================================================

    /// Verifies the credential in an `Authorization` header value.
    pub async fn authenticate(&self, authorization: &str) -> WardenResult<RequestContext> {
        let token = extract_bearer_token(authorization)
            .ok_or_else(|| CredentialError::malformed("missing bearer credential"))?;
        let claims = self.lifecycle.verify_access(token).await?;
        Ok(RequestContext::from_claims(&claims))
    }

    /// Checks that the caller may perform `action` on `resource`.
    pub fn authorize(
        &self,
        context: &RequestContext,
        resource: &str,
        action: &str,
    ) -> WardenResult<()> {
        if self.resolver.has_permission(context.user_id, resource, action) {
            debug!(
                user_id = %context.user_id,
                request_id = %context.request_id,
                resource,
                action,
                "Access granted"
            );
            return Ok(());
        }

        warn!(
            target: SECURITY_TARGET,
            user_id = %context.user_id,
            request_id = %context.request_id,
            resource,
            action,
            "Access denied"
        );
        Err(AccessError::Forbidden {
            user_id: context.user_id,
            resource: resource.to_string(),
            action: action.to_string(),
        }
        .into())
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Returns `true` if the user may perform `action` on `resource`.
    pub fn has_permission(&self, user_id: UserId, resource: &str, action: &str) -> bool {
        self.resolver.has_permission(user_id, resource, action)
    }

    /// Returns `true` if the user holds the `admin` role.
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.resolver.is_admin(user_id)
    }

    /// Returns `true` if the user holds the `moderator` role.
    pub fn is_moderator(&self, user_id: UserId) -> bool {
        self.resolver.is_moderator(user_id)
    }

    /// Returns `true` if the user is an admin or a moderator.
    pub fn can_moderate(&self, user_id: UserId) -> bool {
        self.resolver.can_moderate(user_id)
    }

    /// Returns the roles assigned to a user.
    pub fn roles_of(&self, user_id: UserId) -> Vec<Role> {
        self.resolver.roles_of(user_id)
    }

    /// Returns the active permissions a user holds.
    pub fn permissions_of(&self, user_id: UserId) -> Vec<Permission> {
        self.resolver.store().permissions_of(user_id)
    }

    /// Assigns a role to a user.
    pub fn assign_role(&self, user_id: UserId, role_id: RoleId) -> WardenResult<()> {
        self.resolver.assign_role(user_id, role_id)?;
        info!(user_id = %user_id, role_id = %role_id, "Role assigned");
        Ok(())
    }

    /// Removes a role from a user.
    pub fn remove_role(&self, user_id: UserId, role_id: RoleId) -> WardenResult<()> {
        self.resolver.remove_role(user_id, role_id)?;
        info!(user_id = %user_id, role_id = %role_id, "Role removed");
        Ok(())
    }

    /// Drops the user's cached effective permission set.
    pub fn clear_permission_cache(&self, user_id: UserId) {
        self.resolver.clear_cache(user_id)
    }

    /// Saves the current role/permission relations through the repository.
    ///
    /// Returns `false` when no repository is configured.
    pub async fn persist_rbac(&self) -> WardenResult<bool> {
        let Some(repository) = &self.repository else {
            return Ok(false);
        };
        repository.save(&self.resolver.store().snapshot()).await?;
        Ok(true)
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Starts the background sweeper.
    ///
    /// Returns `false` if the sweeper is disabled or already running.
    pub fn start_background(&self) -> bool {
        if !self.config.sweeper.enabled {
            debug!("Sweeper disabled");
            return false;
        }

        let mut background = self.background.lock();
        if background.is_some() {
            return false;
        }
        *background = Some(self.sweeper.start());
        true
    }

    /// Returns `true` while the background sweeper is running.
    pub fn is_background_running(&self) -> bool {
        self.sweeper.is_running()
    }

    /// Stops the background sweeper and waits for it to exit.
    pub async fn shutdown(&self) {
        let handle = self.background.lock().take();
        let Some(handle) = handle else {
            return;
        };

        self.sweeper.shutdown();
        if let Err(e) = handle.await {
            warn!(error = %e, "Sweeper task ended abnormally");
        }
        info!("Access service stopped");
    }

    /// Runs one sweep immediately and returns the number of entries purged.
    pub fn sweep_now(&self) -> usize {
        self.sweeper.sweep_once()
    }

    /// Returns the number of live sessions.
    pub fn session_count(&self) -> usize {
        self.lifecycle.sessions().len()
    }
}

impl std::fmt::Debug for AccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessService")
            .field("issuer", &self.config.issuer)
            .field("lifecycle", &self.lifecycle)
            .field("sweeper", &self.sweeper)
            .field("persisted", &self.repository.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

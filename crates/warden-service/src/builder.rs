// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Builder wiring an [`AccessService`] from configuration and collaborators.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};
use warden_config::WardenConfig;
use warden_core::WardenResult;
use warden_rbac::{AuthorizationResolver, FileRepository, RbacRepository, RoleStore};
use warden_token::{build_registry, KeyValueStore, SessionTable, Sweeper, TokenLifecycle};

use crate::service::AccessService;

// =============================================================================
// AccessServiceBuilder
// =============================================================================

/// Builder for [`AccessService`].
#[derive(Default)]
pub struct AccessServiceBuilder {
    config: Option<WardenConfig>,
    store: Option<Arc<dyn KeyValueStore>>,
    repository: Option<Arc<dyn RbacRepository>>,
}

impl AccessServiceBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: WardenConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the key-value store backing the `external` and `hybrid`
    /// revocation backends.
    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the repository holding the persisted role/permission relations.
    ///
    /// Without one, `rbac.snapshot_path` selects a [`FileRepository`].
    pub fn rbac_repository(mut self, repository: Arc<dyn RbacRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Validates the configuration and builds the service.
    ///
    /// A persisted snapshot, if the repository has one, replaces the seeded
    /// defaults.
    pub async fn build(self) -> WardenResult<AccessService> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        for warning in config.warnings() {
            warn!("{}", warning);
        }

        let handle = build_registry(&config.revocation, self.store)?;
        let sessions = Arc::new(SessionTable::new());
        let lifecycle =
            TokenLifecycle::from_config(&config, handle.registry.clone(), sessions.clone())?;

        let repository = self.repository.or_else(|| {
            config.rbac.snapshot_path.as_ref().map(|path| {
                Arc::new(FileRepository::new(path.clone())) as Arc<dyn RbacRepository>
            })
        });

        let store = match &repository {
            Some(repository) => match repository.load().await? {
                Some(snapshot) => RoleStore::from_snapshot(snapshot)?,
                None => seeded_store(&config),
            },
            None => seeded_store(&config),
        };
        let resolver = Arc::new(AuthorizationResolver::new(Arc::new(store)));

        let mut sweeper = Sweeper::new(config.sweeper.interval).with_target(sessions);
        if let Some(target) = handle.sweep_target {
            sweeper = sweeper.with_target(target);
        }

        info!(
            issuer = %config.issuer,
            backend = config.revocation.backend.as_str(),
            roles = resolver.store().roles().len(),
            persisted = repository.is_some(),
            "Access service ready"
        );

        Ok(AccessService {
            config: Arc::new(config),
            lifecycle,
            resolver,
            repository,
            sweeper,
            background: Mutex::new(None),
        })
    }
}

fn seeded_store(config: &WardenConfig) -> RoleStore {
    if config.rbac.seed_defaults {
        RoleStore::with_defaults()
    } else {
        RoleStore::new()
    }
}

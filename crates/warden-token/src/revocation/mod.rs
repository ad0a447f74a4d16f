// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Revocation registry.
//!
//! Records token identifiers that must be treated as invalid before their
//! natural expiry. Three interchangeable backends are provided:
//!
//! - [`MemoryRegistry`]: in-process map with a bounded number of entries
//! - [`ExternalRegistry`]: a [`KeyValueStore`] holding one key per entry
//! - [`HybridRegistry`]: the external store as source of truth, with an
//!   in-process read-through cache of confirmed positives
//!
//! # Contract
//!
//! Once [`RevocationRegistry::add`] returns, every subsequent
//! [`RevocationRegistry::is_revoked`] for the same identifier observes
//! `true` until the TTL elapses. A registry never reports `true` for an
//! identifier that was never added.

mod external;
mod hybrid;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use warden_config::{RevocationBackend, RevocationSettings};
use warden_core::{RevocationError, TokenId, WardenError, WardenResult};

use crate::sweeper::Sweep;

pub use external::ExternalRegistry;
pub use hybrid::HybridRegistry;
pub use memory::MemoryRegistry;

// =============================================================================
// RevocationRegistry Trait
// =============================================================================

/// A store of revoked token identifiers with self-expiring entries.
#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    /// Records `token_id` as revoked for at least `ttl`.
    ///
    /// Re-adding an identifier never shortens its existing window.
    async fn add(&self, token_id: &TokenId, ttl: Duration) -> Result<(), RevocationError>;

    /// Returns `true` if `token_id` is currently revoked.
    async fn is_revoked(&self, token_id: &TokenId) -> Result<bool, RevocationError>;

    /// Removes an entry before its expiry.
    async fn remove(&self, token_id: &TokenId) -> Result<(), RevocationError>;

    /// Removes every entry.
    async fn clear(&self) -> Result<(), RevocationError>;

    /// Returns the backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}

// =============================================================================
// KeyValueStore Trait
// =============================================================================

/// Failure reported by an external key-value store.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    /// Error message.
    pub message: String,
}

impl StoreError {
    /// Creates a new store error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<StoreError> for RevocationError {
    fn from(err: StoreError) -> Self {
        RevocationError::store_unavailable(err.message)
    }
}

/// A network key-value store with per-key expiry.
///
/// Implementations enforce their own round-trip timeouts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Sets `key` so that it lives for at least `ttl`.
    ///
    /// An existing key with a later expiry keeps it. The comparison must be
    /// atomic in the store (for Redis, `SET key 1 NX EX ttl` followed by
    /// `EXPIRE key ttl GT` in one transaction).
    async fn set_at_least(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Returns `true` if `key` exists and has not expired.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Deletes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Deletes every key starting with `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> Result<(), StoreError>;
}

// =============================================================================
// Backend Selection
// =============================================================================

/// A constructed registry and the in-process state the sweeper should purge.
pub struct RegistryHandle {
    /// The registry used by the lifecycle manager.
    pub registry: Arc<dyn RevocationRegistry>,
    /// In-process entries needing periodic reclamation, if any.
    pub sweep_target: Option<Arc<dyn Sweep>>,
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("backend", &self.registry.backend_name())
            .field("sweep_target", &self.sweep_target.is_some())
            .finish()
    }
}

/// Builds the registry selected by `settings`.
///
/// The `external` and `hybrid` backends need a key-value store; asking for
/// one without supplying a store is a configuration error.
pub fn build_registry(
    settings: &RevocationSettings,
    store: Option<Arc<dyn KeyValueStore>>,
) -> WardenResult<RegistryHandle> {
    let external = |store: Option<Arc<dyn KeyValueStore>>| {
        store
            .map(|store| ExternalRegistry::new(store).with_prefix(settings.key_prefix.clone()))
            .ok_or_else(|| {
                WardenError::config(format!(
                    "revocation backend '{}' requires a key-value store",
                    settings.backend.as_str()
                ))
            })
    };

    let handle = match settings.backend {
        RevocationBackend::Memory => {
            let registry = Arc::new(MemoryRegistry::new(settings.max_entries));
            RegistryHandle {
                registry: registry.clone(),
                sweep_target: Some(registry),
            }
        }
        RevocationBackend::External => RegistryHandle {
            registry: Arc::new(external(store)?),
            sweep_target: None,
        },
        RevocationBackend::Hybrid => {
            let registry = HybridRegistry::new(
                external(store)?,
                MemoryRegistry::new(settings.max_entries),
                settings.cache_ttl,
            );
            let cache = registry.cache();
            RegistryHandle {
                registry: Arc::new(registry),
                sweep_target: Some(cache),
            }
        }
    };

    tracing::info!(
        backend = handle.registry.backend_name(),
        max_entries = settings.max_entries,
        "Revocation registry ready"
    );

    Ok(handle)
}

// =============================================================================
// Tests
// =============================================================================

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Two-tier revocation registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use warden_core::{RevocationError, TokenId};

use super::{ExternalRegistry, MemoryRegistry, RevocationRegistry};

/// External store as source of truth, fronted by an in-process cache.
///
/// The cache only ever holds confirmed positives and each lives at most
/// `cache_ttl`. A negative lookup always goes to the store.
#[derive(Debug)]
pub struct HybridRegistry {
    external: ExternalRegistry,
    cache: Arc<MemoryRegistry>,
    cache_ttl: Duration,
}

impl HybridRegistry {
    /// Composes an external registry and an in-process cache.
    pub fn new(external: ExternalRegistry, cache: MemoryRegistry, cache_ttl: Duration) -> Self {
        Self {
            external,
            cache: Arc::new(cache),
            cache_ttl,
        }
    }

    /// Returns the cache layer, for the sweeper.
    pub fn cache(&self) -> Arc<MemoryRegistry> {
        self.cache.clone()
    }

    fn remember(&self, token_id: &TokenId, ttl: Duration) {
        // A full cache only costs extra store round trips.
        if let Err(e) = self.cache.insert(token_id, ttl.min(self.cache_ttl)) {
            debug!(error = %e, "Revocation cache full; entry not cached");
        }
    }
}

#[async_trait]
impl RevocationRegistry for HybridRegistry {
    async fn add(&self, token_id: &TokenId, ttl: Duration) -> Result<(), RevocationError> {
        self.external.add(token_id, ttl).await?;
        self.remember(token_id, ttl);
        Ok(())
    }

    async fn is_revoked(&self, token_id: &TokenId) -> Result<bool, RevocationError> {
        if self.cache.contains(token_id) {
            return Ok(true);
        }

        let revoked = self.external.is_revoked(token_id).await?;
        if revoked {
            self.remember(token_id, self.cache_ttl);
        }
        Ok(revoked)
    }

    async fn remove(&self, token_id: &TokenId) -> Result<(), RevocationError> {
        self.external.remove(token_id).await?;
        self.cache.delete(token_id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RevocationError> {
        self.external.clear().await?;
        self.cache.delete_all();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "hybrid"
    }
}

// =============================================================================
// Tests
// =============================================================================

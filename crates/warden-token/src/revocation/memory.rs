// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-process revocation registry.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};
use warden_core::{RevocationError, TokenId};

use super::RevocationRegistry;
use crate::sweeper::Sweep;

/// Upper bound for entry lifetimes, far beyond any credential window.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Revoked identifiers held in a single locked map.
///
/// Capacity is bounded by `max_entries`. When the map is full, expired
/// entries are dropped first; if every entry is still live the insert fails
/// with [`RevocationError::CapacityExceeded`] rather than evicting one.
#[derive(Debug)]
pub struct MemoryRegistry {
    entries: RwLock<HashMap<TokenId, Instant>>,
    max_entries: usize,
}

impl MemoryRegistry {
    /// Creates a registry holding at most `max_entries` live entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Returns the number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Records `token_id` until `ttl` from now, keeping any later expiry.
    pub fn insert(&self, token_id: &TokenId, ttl: Duration) -> Result<(), RevocationError> {
        let now = Instant::now();
        let expires_at = now + ttl.min(MAX_TTL);

        let mut entries = self.entries.write();

        if let Some(existing) = entries.get_mut(token_id) {
            if *existing < expires_at {
                *existing = expires_at;
            }
            return Ok(());
        }

        if entries.len() >= self.max_entries {
            let before = entries.len();
            entries.retain(|_, expiry| *expiry > now);
            debug!(
                purged = before - entries.len(),
                "Purged expired revocation entries at capacity"
            );

            if entries.len() >= self.max_entries {
                warn!(
                    capacity = self.max_entries,
                    "Revocation registry full of live entries"
                );
                return Err(RevocationError::CapacityExceeded {
                    capacity: self.max_entries,
                });
            }
        }

        entries.insert(token_id.clone(), expires_at);
        Ok(())
    }

    /// Returns `true` if `token_id` has an unexpired entry.
    pub fn contains(&self, token_id: &TokenId) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .get(token_id)
            .is_some_and(|expiry| *expiry > now)
    }

    /// Removes `token_id`.
    pub fn delete(&self, token_id: &TokenId) -> bool {
        self.entries.write().remove(token_id).is_some()
    }

    /// Removes every entry.
    pub fn delete_all(&self) {
        self.entries.write().clear();
    }
}

#[async_trait]
impl RevocationRegistry for MemoryRegistry {
    async fn add(&self, token_id: &TokenId, ttl: Duration) -> Result<(), RevocationError> {
        self.insert(token_id, ttl)
    }

    async fn is_revoked(&self, token_id: &TokenId) -> Result<bool, RevocationError> {
        Ok(self.contains(token_id))
    }

    async fn remove(&self, token_id: &TokenId) -> Result<(), RevocationError> {
        self.delete(token_id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RevocationError> {
        self.delete_all();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl Sweep for MemoryRegistry {
    fn name(&self) -> &'static str {
        "revocation"
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, expiry| *expiry > now);
        before - entries.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn id(s: &str) -> TokenId {
        TokenId::new(s)
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_and_expire() {
        let registry = MemoryRegistry::new(10);
        registry.add(&id("a"), Duration::from_secs(60)).await.unwrap();

        assert!(registry.is_revoked(&id("a")).await.unwrap());
        assert!(!registry.is_revoked(&id("b")).await.unwrap());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(registry.is_revoked(&id("a")).await.unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!registry.is_revoked(&id("a")).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_readd_never_shortens() {
        let registry = MemoryRegistry::new(10);
        registry.add(&id("a"), Duration::from_secs(100)).await.unwrap();
        registry.add(&id("a"), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        assert!(registry.is_revoked(&id("a")).await.unwrap());

        registry.add(&id("a"), Duration::from_secs(200)).await.unwrap();
        tokio::time::advance(Duration::from_secs(100)).await;
        assert!(registry.is_revoked(&id("a")).await.unwrap());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_purges_expired_first() {
        let registry = MemoryRegistry::new(2);
        registry.add(&id("a"), Duration::from_secs(1)).await.unwrap();
        registry.add(&id("b"), Duration::from_secs(100)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        registry.add(&id("c"), Duration::from_secs(100)).await.unwrap();

        assert!(registry.is_revoked(&id("b")).await.unwrap());
        assert!(registry.is_revoked(&id("c")).await.unwrap());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_exceeded_keeps_live_entries() {
        let registry = MemoryRegistry::new(2);
        registry.add(&id("a"), Duration::from_secs(100)).await.unwrap();
        registry.add(&id("b"), Duration::from_secs(100)).await.unwrap();

        let err = registry
            .add(&id("c"), Duration::from_secs(100))
            .await
            .unwrap_err();
        assert_eq!(err, RevocationError::CapacityExceeded { capacity: 2 });
        assert!(registry.is_revoked(&id("a")).await.unwrap());
        assert!(registry.is_revoked(&id("b")).await.unwrap());

        // Extending an existing entry still works at capacity.
        registry.add(&id("a"), Duration::from_secs(500)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_clear() {
        let registry = MemoryRegistry::new(10);
        registry.add(&id("a"), Duration::from_secs(60)).await.unwrap();
        registry.add(&id("b"), Duration::from_secs(60)).await.unwrap();

        registry.remove(&id("a")).await.unwrap();
        assert!(!registry.is_revoked(&id("a")).await.unwrap());

        registry.clear().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let registry = MemoryRegistry::new(10);
        registry.add(&id("short"), Duration::from_secs(1)).await.unwrap();
        registry.add(&id("long"), Duration::from_secs(600)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(registry.purge_expired(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_visible_to_all_readers() {
        let registry = Arc::new(MemoryRegistry::new(10_000));
        let mut handles = Vec::new();

        for i in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                for j in 0..100 {
                    let token = TokenId::new(format!("{}-{}", i, j));
                    registry.add(&token, Duration::from_secs(600)).await.unwrap();
                    assert!(registry.is_revoked(&token).await.unwrap());
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.len(), 800);
    }
}

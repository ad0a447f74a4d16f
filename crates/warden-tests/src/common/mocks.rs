// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! In-memory stand-ins for the external collaborators, with call counters
//! and error injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use warden_core::{WardenError, WardenResult};
use warden_rbac::{RbacRepository, RbacSnapshot};
use warden_token::{KeyValueStore, StoreError};

// =============================================================================
// Mock Key-Value Store
// =============================================================================

/// A key-value store with per-key expiry on the tokio clock.
#[derive(Debug, Default)]
pub struct MockKeyValueStore {
    entries: RwLock<HashMap<String, Instant>>,
    failing: AtomicBool,
    sets: AtomicU64,
    lookups: AtomicU64,
}

impl MockKeyValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `set_at_least` calls.
    pub fn set_count(&self) -> u64 {
        self.sets.load(Ordering::SeqCst)
    }

    /// Number of `exists` calls.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Returns the live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, expires)| **expires > now)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::new("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MockKeyValueStore {
    async fn set_at_least(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.write();
        let expires = entries.entry(key.to_string()).or_insert(now);
        *expires = (*expires).max(now + ttl);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .get(key)
            .is_some_and(|expires| *expires > now))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.write().remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.write().retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

// =============================================================================
// Mock RBAC Repository
// =============================================================================

/// An RBAC repository holding the snapshot in memory.
#[derive(Debug, Default)]
pub struct MockRbacRepository {
    snapshot: Mutex<Option<RbacSnapshot>>,
    saves: AtomicU64,
    failing: AtomicBool,
}

impl MockRbacRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository preloaded with `snapshot`.
    pub fn with_snapshot(snapshot: RbacSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved snapshot.
    pub fn stored(&self) -> Option<RbacSnapshot> {
        self.snapshot.lock().clone()
    }

    fn check(&self) -> WardenResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(WardenError::internal("repository unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RbacRepository for MockRbacRepository {
    async fn load(&self) -> WardenResult<Option<RbacSnapshot>> {
        self.check()?;
        Ok(self.snapshot.lock().clone())
    }

    async fn save(&self, snapshot: &RbacSnapshot) -> WardenResult<()> {
        self.check()?;
        *self.snapshot.lock() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

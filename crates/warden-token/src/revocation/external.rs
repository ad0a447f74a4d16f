// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Revocation registry backed by an external key-value store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::error;
use warden_core::{RevocationError, TokenId};

use super::{KeyValueStore, RevocationRegistry};

/// Default key prefix for revocation entries.
pub const DEFAULT_KEY_PREFIX: &str = "warden:revoked:";

/// One store key per revoked identifier, expiring with the entry.
///
/// Every store failure is reported as
/// [`RevocationError::StoreUnavailable`]; callers treat it as a negative
/// answer.
pub struct ExternalRegistry {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl ExternalRegistry {
    /// Creates a registry over `store` using the default key prefix.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Sets the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, token_id: &TokenId) -> String {
        format!("{}{}", self.prefix, token_id)
    }
}

impl std::fmt::Debug for ExternalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalRegistry")
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[async_trait]
impl RevocationRegistry for ExternalRegistry {
    async fn add(&self, token_id: &TokenId, ttl: Duration) -> Result<(), RevocationError> {
        self.store
            .set_at_least(&self.key(token_id), ttl)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to record revocation");
                e.into()
            })
    }

    async fn is_revoked(&self, token_id: &TokenId) -> Result<bool, RevocationError> {
        self.store.exists(&self.key(token_id)).await.map_err(|e| {
            error!(error = %e, "Failed to query revocation store");
            e.into()
        })
    }

    async fn remove(&self, token_id: &TokenId) -> Result<(), RevocationError> {
        self.store
            .delete(&self.key(token_id))
            .await
            .map_err(Into::into)
    }

    async fn clear(&self) -> Result<(), RevocationError> {
        self.store
            .delete_prefix(&self.prefix)
            .await
            .map_err(Into::into)
    }

    fn backend_name(&self) -> &'static str {
        "external"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use crate::revocation::StoreError;

    #[derive(Default)]
    struct RecordingStore {
        keys: Mutex<HashMap<String, Duration>>,
        down: bool,
    }

    impl RecordingStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.down {
                Err(StoreError::new("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for RecordingStore {
        async fn set_at_least(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
            self.check()?;
            let mut keys = self.keys.lock();
            let entry = keys.entry(key.to_string()).or_insert(ttl);
            *entry = (*entry).max(ttl);
            Ok(())
        }

        async fn exists(&self, key: &str) -> Result<bool, StoreError> {
            self.check()?;
            Ok(self.keys.lock().contains_key(key))
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.check()?;
            self.keys.lock().remove(key);
            Ok(())
        }

        async fn delete_prefix(&self, prefix: &str) -> Result<(), StoreError> {
            self.check()?;
            self.keys.lock().retain(|k, _| !k.starts_with(prefix));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_keys_use_prefix() {
        let store = Arc::new(RecordingStore::default());
        let registry = ExternalRegistry::new(store.clone()).with_prefix("t:");

        registry
            .add(&TokenId::new("abc"), Duration::from_secs(42))
            .await
            .unwrap();

        assert_eq!(
            store.keys.lock().get("t:abc").copied(),
            Some(Duration::from_secs(42))
        );
        assert!(registry.is_revoked(&TokenId::new("abc")).await.unwrap());
        assert!(!registry.is_revoked(&TokenId::new("xyz")).await.unwrap());
    }

    #[tokio::test]
    async fn test_readd_never_shortens() {
        let store = Arc::new(RecordingStore::default());
        let registry = ExternalRegistry::new(store.clone()).with_prefix("t:");
        let id = TokenId::new("abc");

        registry.add(&id, Duration::from_secs(600)).await.unwrap();
        registry.add(&id, Duration::from_secs(5)).await.unwrap();
        assert_eq!(
            store.keys.lock().get("t:abc").copied(),
            Some(Duration::from_secs(600))
        );

        registry.add(&id, Duration::from_secs(900)).await.unwrap();
        assert_eq!(
            store.keys.lock().get("t:abc").copied(),
            Some(Duration::from_secs(900))
        );
    }

    #[tokio::test]
    async fn test_clear_only_touches_prefix() {
        let store = Arc::new(RecordingStore::default());
        store.keys.lock().insert("other:1".into(), Duration::from_secs(1));
        let registry = ExternalRegistry::new(store.clone());

        registry
            .add(&TokenId::new("a"), Duration::from_secs(1))
            .await
            .unwrap();
        registry.clear().await.unwrap();

        let keys = store.keys.lock();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains_key("other:1"));
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let store = Arc::new(RecordingStore {
            down: true,
            ..Default::default()
        });
        let registry = ExternalRegistry::new(store);

        let err = registry.is_revoked(&TokenId::new("a")).await.unwrap_err();
        assert!(matches!(err, RevocationError::StoreUnavailable { .. }));

        let err = registry
            .add(&TokenId::new("a"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}

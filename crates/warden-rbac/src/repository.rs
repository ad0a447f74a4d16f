// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persisted form of the role/permission store.
//!
//! The durable user/role/permission store is an external collaborator;
//! [`RbacRepository`] is the contract it satisfies. [`FileRepository`]
//! keeps the snapshot in a JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};
use warden_core::{WardenError, WardenResult};

use crate::store::RbacSnapshot;

/// Loads and saves [`RbacSnapshot`]s.
#[async_trait]
pub trait RbacRepository: Send + Sync {
    /// Loads the persisted snapshot, or `None` if nothing was saved yet.
    async fn load(&self) -> WardenResult<Option<RbacSnapshot>>;

    /// Replaces the persisted snapshot.
    async fn save(&self, snapshot: &RbacSnapshot) -> WardenResult<()>;
}

/// Snapshot stored as pretty-printed JSON.
///
/// Saves write a sibling temporary file and rename it over the target.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    /// Creates a repository at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RbacRepository for FileRepository {
    async fn load(&self) -> WardenResult<Option<RbacSnapshot>> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No RBAC snapshot found");
                return Ok(None);
            }
            Err(e) => {
                return Err(WardenError::internal(format!(
                    "Failed to read RBAC snapshot '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let snapshot: RbacSnapshot = serde_json::from_slice(&content).map_err(|e| {
            WardenError::config(format!(
                "Invalid RBAC snapshot '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        info!(
            path = %self.path.display(),
            roles = snapshot.roles.len(),
            assignments = snapshot.assignments.len(),
            "Loaded RBAC snapshot"
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &RbacSnapshot) -> WardenResult<()> {
        let content = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| WardenError::internal(format!("Failed to encode RBAC snapshot: {}", e)))?;

        let temp = self.temp_path();
        let io_err = |e: std::io::Error| {
            WardenError::internal(format!(
                "Failed to write RBAC snapshot '{}': {}",
                self.path.display(),
                e
            ))
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&temp, content).await.map_err(io_err)?;
        tokio::fs::rename(&temp, &self.path).await.map_err(io_err)?;

        debug!(path = %self.path.display(), "Saved RBAC snapshot");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema for warden.
//!
//! ```yaml
//! issuer: warden
//! access:
//!   secret: "${ACCESS_SECRET}"
//!   ttl: 900
//! refresh:
//!   secret: "${REFRESH_SECRET}"
//!   ttl: 604800
//! revocation:
//!   backend: hybrid
//!   max_entries: 100000
//!   cache_ttl: 30
//! sweeper:
//!   interval: 60
//! rbac:
//!   seed_defaults: true
//!   snapshot_path: /var/lib/warden/rbac.json
//! logging:
//!   level: info
//!   format: json
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Minimum recommended secret length in bytes.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

// =============================================================================
// WardenConfig
// =============================================================================

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Issuer tag embedded in and required of every credential.
    pub issuer: String,
    /// Access credential settings.
    pub access: CredentialSettings,
    /// Refresh credential settings.
    pub refresh: CredentialSettings,
    /// Revocation registry settings.
    pub revocation: RevocationSettings,
    /// Background sweeper settings.
    pub sweeper: SweeperSettings,
    /// Role/permission settings.
    pub rbac: RbacSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            access: CredentialSettings::access_defaults(),
            refresh: CredentialSettings::refresh_defaults(),
            revocation: RevocationSettings::default(),
            sweeper: SweeperSettings::default(),
            rbac: RbacSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl WardenConfig {
    /// Creates a configuration with the given secrets and default values.
    pub fn with_secrets(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.access.secret = access_secret.into();
        config.refresh.secret = refresh_secret.into();
        config
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation("issuer", "cannot be empty"));
        }

        self.access.validate("access")?;
        self.refresh.validate("refresh")?;

        if self.access.secret == self.refresh.secret {
            return Err(ConfigError::validation(
                "refresh.secret",
                "must differ from access.secret",
            ));
        }

        if self.access.ttl >= self.refresh.ttl {
            return Err(ConfigError::validation(
                "access.ttl",
                "must be shorter than refresh.ttl",
            ));
        }

        self.revocation.validate()?;

        if self.sweeper.enabled && self.sweeper.interval >= self.access.ttl {
            return Err(ConfigError::validation(
                "sweeper.interval",
                "must be shorter than access.ttl",
            ));
        }
        if self.sweeper.interval.is_zero() {
            return Err(ConfigError::validation("sweeper.interval", "must be positive"));
        }

        Ok(())
    }

    /// Returns human-readable warnings for settings that are valid but unwise.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (name, settings) in [("access", &self.access), ("refresh", &self.refresh)] {
            if settings.secret.len() < RECOMMENDED_SECRET_LEN {
                warnings.push(format!(
                    "{}.secret is shorter than recommended ({} bytes)",
                    name, RECOMMENDED_SECRET_LEN
                ));
            }
        }

        if !self.sweeper.enabled && self.revocation.backend != RevocationBackend::External {
            warnings.push(
                "sweeper is disabled; expired in-process entries are only evicted at capacity"
                    .to_string(),
            );
        }

        warnings
    }
}

fn default_issuer() -> String {
    "warden".to_string()
}

// =============================================================================
// CredentialSettings
// =============================================================================

/// Settings for one credential class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// HMAC secret. Never serialized back out.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Validity window.
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self::access_defaults()
    }
}

impl CredentialSettings {
    /// Defaults for access credentials (15 minutes).
    pub fn access_defaults() -> Self {
        Self {
            secret: String::new(),
            ttl: Duration::from_secs(15 * 60),
            algorithm: SigningAlgorithm::default(),
        }
    }

    /// Defaults for refresh credentials (7 days).
    pub fn refresh_defaults() -> Self {
        Self {
            secret: String::new(),
            ttl: Duration::from_secs(7 * 24 * 60 * 60),
            algorithm: SigningAlgorithm::default(),
        }
    }

    /// Sets the secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Sets the validity window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn validate(&self, section: &str) -> ConfigResult<()> {
        if self.secret.is_empty() {
            return Err(ConfigError::validation(
                format!("{}.secret", section),
                "cannot be empty",
            ));
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::validation(
                format!("{}.ttl", section),
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// HMAC signing algorithm for a credential class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    #[default]
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

// =============================================================================
// RevocationSettings
// =============================================================================

/// Revocation registry backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationBackend {
    /// In-process map.
    #[default]
    Memory,
    /// External key-value store.
    External,
    /// In-process read-through cache in front of the external store.
    Hybrid,
}

impl RevocationBackend {
    /// Parses a backend name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "in-process" => Some(RevocationBackend::Memory),
            "external" | "kv" => Some(RevocationBackend::External),
            "hybrid" => Some(RevocationBackend::Hybrid),
            _ => None,
        }
    }

    /// Returns the backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationBackend::Memory => "memory",
            RevocationBackend::External => "external",
            RevocationBackend::Hybrid => "hybrid",
        }
    }

    /// Returns `true` if this backend needs an external key-value store.
    pub fn requires_store(&self) -> bool {
        !matches!(self, RevocationBackend::Memory)
    }
}

/// Revocation registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevocationSettings {
    /// Backend to construct.
    pub backend: RevocationBackend,
    /// Maximum live entries held in process.
    pub max_entries: usize,
    /// Lifetime of confirmed positives in the hybrid cache.
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
    /// Key prefix in the external store.
    pub key_prefix: String,
}

impl Default for RevocationSettings {
    fn default() -> Self {
        Self {
            backend: RevocationBackend::Memory,
            max_entries: 100_000,
            cache_ttl: Duration::from_secs(30),
            key_prefix: "warden:revoked:".to_string(),
        }
    }
}

impl RevocationSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_entries == 0 {
            return Err(ConfigError::validation(
                "revocation.max_entries",
                "must be positive",
            ));
        }
        if self.backend == RevocationBackend::Hybrid && self.cache_ttl.is_zero() {
            return Err(ConfigError::validation(
                "revocation.cache_ttl",
                "must be positive for the hybrid backend",
            ));
        }
        if self.backend.requires_store() && self.key_prefix.is_empty() {
            return Err(ConfigError::validation(
                "revocation.key_prefix",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// SweeperSettings
// =============================================================================

/// Background reclamation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeperSettings {
    /// Whether the sweeper runs.
    pub enabled: bool,
    /// Interval between sweeps.
    #[serde(with = "duration_secs")]
    pub interval: Duration,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// RbacSettings
// =============================================================================

/// Role/permission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacSettings {
    /// Seed the well-known `user`, `admin` and `moderator` roles.
    pub seed_defaults: bool,
    /// JSON snapshot of the persisted role/permission relations.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for RbacSettings {
    fn default() -> Self {
        Self {
            seed_defaults: true,
            snapshot_path: None,
        }
    }
}

// =============================================================================
// LoggingSettings
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON lines.
    Json,
    /// Compact single-line text.
    Compact,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> WardenConfig {
        WardenConfig::with_secrets(
            "access-secret-that-is-long-enough-for-hs256",
            "refresh-secret-that-is-long-enough-for-hs256",
        )
    }

    #[test]
    fn test_default_windows() {
        let config = WardenConfig::default();
        assert_eq!(config.access.ttl, Duration::from_secs(900));
        assert_eq!(config.refresh.ttl, Duration::from_secs(604_800));
        assert_eq!(config.revocation.backend, RevocationBackend::Memory);
        assert!(config.rbac.seed_defaults);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let config = WardenConfig::default();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("access.secret"));
    }

    #[test]
    fn test_shared_secret_rejected() {
        let config = WardenConfig::with_secrets("same-secret", "same-secret");
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("refresh.secret"));
    }

    #[test]
    fn test_access_window_must_be_shorter() {
        let mut config = valid_config();
        config.access.ttl = config.refresh.ttl;
        assert_eq!(config.validate().unwrap_err().field(), Some("access.ttl"));
    }

    #[test]
    fn test_sweep_interval_must_be_shorter_than_access_window() {
        let mut config = valid_config();
        config.sweeper.interval = config.access.ttl;
        assert_eq!(
            config.validate().unwrap_err().field(),
            Some("sweeper.interval")
        );
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = valid_config();
        config.revocation.max_entries = 0;
        assert_eq!(
            config.validate().unwrap_err().field(),
            Some("revocation.max_entries")
        );
    }

    #[test]
    fn test_short_secret_warning() {
        let config = WardenConfig::with_secrets("short-a", "short-b");
        assert!(config.validate().is_ok());
        assert_eq!(config.warnings().len(), 2);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(RevocationBackend::parse("HYBRID"), Some(RevocationBackend::Hybrid));
        assert_eq!(RevocationBackend::parse("kv"), Some(RevocationBackend::External));
        assert_eq!(RevocationBackend::parse("disk"), None);
        assert!(RevocationBackend::Hybrid.requires_store());
        assert!(!RevocationBackend::Memory.requires_store());
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_string(&valid_config()).unwrap();
        assert!(!json.contains("access-secret"));
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for warden.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and pick the format from its extension
//! 2. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw text
//! 3. Parse into [`WardenConfig`]
//! 4. Apply `WARDEN_*` environment overrides
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! WARDEN_ACCESS_SECRET=...
//! WARDEN_REFRESH_SECRET=...
//! WARDEN_ISSUER=auth.example.com
//! WARDEN_REVOCATION_BACKEND=hybrid
//! WARDEN_LOG_LEVEL=debug
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{RevocationBackend, WardenConfig};

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use warden_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("warden.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to resolve placeholders and apply overrides.
    resolve_env_vars: bool,

    /// Whether to resolve a relative snapshot path against the file's directory.
    resolve_paths: bool,
}

impl ConfigLoader {
    /// Creates a new loader with the `WARDEN` prefix.
    pub fn new() -> Self {
        Self {
            env_prefix: "WARDEN".to_string(),
            resolve_env_vars: true,
            resolve_paths: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Enables or disables relative path resolution.
    pub fn with_path_resolution(mut self, enabled: bool) -> Self {
        self.resolve_paths = enabled;
        self
    }

    /// Loads and validates configuration from a file.
    ///
    /// The format is taken from the extension: `.yaml`/`.yml`, `.toml` or `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<WardenConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;

        let mut config = self
            .parse_content(&content, format)
            .map_err(|e| match e {
                ConfigError::Serialization { message } => ConfigError::parse(path, message),
                other => other,
            })?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        if self.resolve_paths {
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            if let Some(snapshot) = config.rbac.snapshot_path.as_mut() {
                if snapshot.is_relative() {
                    *snapshot = base.join(&*snapshot);
                }
            }
        }

        self.finish(config)
    }

    /// Loads and validates configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<WardenConfig> {
        let mut config = self.parse_content(content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        self.finish(config)
    }

    fn finish(&self, config: WardenConfig) -> ConfigResult<WardenConfig> {
        config.validate()?;

        for warning in config.warnings() {
            warn!("{}", warning);
        }

        debug!(
            issuer = %config.issuer,
            backend = config.revocation.backend.as_str(),
            access_ttl_secs = config.access.ttl.as_secs(),
            refresh_ttl_secs = config.refresh.ttl.as_secs(),
            "Configuration loaded"
        );

        Ok(config)
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn parse_content(&self, content: &str, format: ConfigFormat) -> ConfigResult<WardenConfig> {
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        parse_str(&content, format)
    }

    /// Applies `<PREFIX>_*` environment overrides.
    fn apply_env_overrides(&self, config: &mut WardenConfig) -> ConfigResult<()> {
        if let Some(value) = self.env("ACCESS_SECRET") {
            config.access.secret = value;
        }
        if let Some(value) = self.env("REFRESH_SECRET") {
            config.refresh.secret = value;
        }
        if let Some(value) = self.env("ISSUER") {
            config.issuer = value;
        }
        if let Some(value) = self.env("REVOCATION_BACKEND") {
            config.revocation.backend = RevocationBackend::parse(&value).ok_or_else(|| {
                ConfigError::invalid_env_var(
                    self.env_name("REVOCATION_BACKEND"),
                    "expected memory, external or hybrid",
                )
            })?;
        }
        if let Some(value) = self.env("LOG_LEVEL") {
            config.logging.level = value;
        }

        Ok(())
    }

    fn env_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.env_prefix, suffix)
    }

    fn env(&self, suffix: &str) -> Option<String> {
        env::var(self.env_name(suffix)).ok()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn parse_str(content: &str, format: ConfigFormat) -> ConfigResult<WardenConfig> {
    match format {
        ConfigFormat::Yaml => parse_yaml(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

fn parse_yaml<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

/// Replaces `${VAR}` and `${VAR:default}` with environment values.
///
/// An unset variable without a default is left in place so that validation
/// reports the field rather than silently accepting an empty value.
fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let inner = &after[..end];
        let (name, default) = match inner.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (inner, None),
        };

        match (env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!("Environment variable '{}' not found", name);
                result.push_str(&rest[start..start + 2 + end + 1]);
            }
        }

        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
///
/// # Examples
///
/// ```no_run
/// use warden_config::loader::load_config;
///
/// let config = load_config("warden.yaml").unwrap();
/// ```
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<WardenConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with default settings.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<WardenConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    use crate::schema::{LogFormat, SigningAlgorithm};

    const YAML: &str = r#"
issuer: auth.example.com
access:
  secret: access-secret-0123456789abcdef0123456789
  ttl: 600
refresh:
  secret: refresh-secret-0123456789abcdef012345678
  ttl: 86400
  algorithm: HS512
revocation:
  backend: hybrid
  max_entries: 500
  cache_ttl: 10
logging:
  level: debug
  format: json
"#;

    fn loader() -> ConfigLoader {
        // Isolated prefix so ambient WARDEN_* variables cannot leak in.
        ConfigLoader::new().with_env_prefix("WARDEN_LOADER_TEST")
    }

    #[test]
    fn test_load_yaml_str() {
        let config = loader().load_from_str(YAML, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.issuer, "auth.example.com");
        assert_eq!(config.access.ttl, Duration::from_secs(600));
        assert_eq!(config.refresh.algorithm, SigningAlgorithm::HS512);
        assert_eq!(config.revocation.backend, RevocationBackend::Hybrid);
        assert_eq!(config.revocation.max_entries, 500);
        assert_eq!(config.logging.format, LogFormat::Json);
        // Unspecified sections keep their defaults.
        assert!(config.sweeper.enabled);
        assert_eq!(config.sweeper.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_load_toml_str() {
        let toml = r#"
            [access]
            secret = "a-secret"
            ttl = 300

            [refresh]
            secret = "r-secret"
            ttl = 3600
        "#;
        let config = loader().load_from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.access.ttl, Duration::from_secs(300));
        assert_eq!(config.issuer, "warden");
    }

    #[test]
    fn test_load_json_str() {
        let json = r#"{"access":{"secret":"a","ttl":120},"refresh":{"secret":"r","ttl":240},"sweeper":{"interval":30}}"#;
        let config = loader().load_from_str(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.refresh.ttl, Duration::from_secs(240));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let json = r#"{"access":{"secret":"same"},"refresh":{"secret":"same"}}"#;
        let err = loader().load_from_str(json, ConfigFormat::Json).unwrap_err();
        assert_eq!(err.field(), Some("refresh.secret"));
    }

    #[test]
    fn test_placeholder_resolution() {
        env::set_var("WARDEN_PLACEHOLDER_TEST_SECRET", "from-env");
        let resolved = resolve_env_placeholders(
            "secret: ${WARDEN_PLACEHOLDER_TEST_SECRET}\nbackend: ${WARDEN_PLACEHOLDER_UNSET:memory}\nother: ${WARDEN_PLACEHOLDER_MISSING}",
        );
        assert_eq!(
            resolved,
            "secret: from-env\nbackend: memory\nother: ${WARDEN_PLACEHOLDER_MISSING}"
        );
    }

    #[test]
    fn test_unterminated_placeholder_kept() {
        assert_eq!(resolve_env_placeholders("a ${B"), "a ${B");
    }

    #[test]
    fn test_env_overrides() {
        let loader = ConfigLoader::new().with_env_prefix("WARDEN_OVR_TEST");
        env::set_var("WARDEN_OVR_TEST_ACCESS_SECRET", "overridden-access");
        env::set_var("WARDEN_OVR_TEST_REVOCATION_BACKEND", "external");

        let config = loader.load_from_str(YAML, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.access.secret, "overridden-access");
        assert_eq!(config.revocation.backend, RevocationBackend::External);
    }

    #[test]
    fn test_invalid_backend_override() {
        let loader = ConfigLoader::new().with_env_prefix("WARDEN_BAD_TEST");
        env::set_var("WARDEN_BAD_TEST_REVOCATION_BACKEND", "postgres");

        let err = loader.load_from_str(YAML, ConfigFormat::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_load_file_resolves_snapshot_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.yaml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "{}\nrbac:\n  snapshot_path: rbac.json", YAML).unwrap();

        let config = loader().load(&path).unwrap();
        assert_eq!(config.rbac.snapshot_path, Some(dir.path().join("rbac.json")));
    }

    #[test]
    fn test_missing_file() {
        let err = loader().load("/nonexistent/warden.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert!(ConfigFormat::from_path(Path::new("a.ini")).is_err());
        assert!(ConfigFormat::from_path(Path::new("noext")).is_err());
    }
}

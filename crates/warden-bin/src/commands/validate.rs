// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use warden_config::WardenConfig;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: &ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = warden_config::load_config(config_path)
        .map_err(|e| BinError::config(format!("Configuration validation failed: {}", e)))?;

    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Issuer:        {}", config.issuer);
            println!("  Access TTL:    {}s", config.access.ttl.as_secs());
            println!("  Refresh TTL:   {}s", config.refresh.ttl.as_secs());
            println!("  Revocation:    {}", config.revocation.backend.as_str());
            println!(
                "  Sweeper:       {}",
                if config.sweeper.enabled {
                    format!("every {}s", config.sweeper.interval.as_secs())
                } else {
                    "disabled".to_string()
                }
            );
            println!(
                "  RBAC snapshot: {}",
                config
                    .rbac
                    .snapshot_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string())
            );

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", to_json(&config)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "issuer": config.issuer,
                    "access_ttl_secs": config.access.ttl.as_secs(),
                    "refresh_ttl_secs": config.refresh.ttl.as_secs(),
                    "revocation_backend": config.revocation.backend.as_str(),
                    "sweeper_enabled": config.sweeper.enabled,
                    "sweeper_interval_secs": config.sweeper.interval.as_secs(),
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            println!("{}", to_json(&output)?);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Returns configuration warnings, including filesystem checks.
pub(crate) fn collect_warnings(config: &WardenConfig) -> Vec<String> {
    let mut warnings = config.warnings();

    if let Some(parent) = config
        .rbac
        .snapshot_path
        .as_ref()
        .and_then(|path| path.parent())
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        if !parent.exists() {
            warnings.push(format!(
                "RBAC snapshot directory does not exist: {}",
                parent.display()
            ));
        }
    }

    if config.revocation.backend.requires_store() {
        warnings.push(format!(
            "revocation backend '{}' needs a key-value store supplied by the host process",
            config.revocation.backend.as_str()
        ));
    }

    warnings
}

fn to_json<T: serde::Serialize>(value: &T) -> BinResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BinError::runtime(format!("Failed to render JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_for(path: &std::path::Path) -> Cli {
        Cli::parse_from(["warden", "-c", path.to_str().unwrap(), "validate"])
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(&dir.path().join("absent.yaml"));
        let err = validate(&cli, &ValidateArgs::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_valid_file_with_strict_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.json");
        std::fs::write(
            &path,
            r#"{
                "access": { "secret": "short-access" },
                "refresh": { "secret": "short-refresh" },
                "rbac": { "snapshot_path": "missing/rbac.json" }
            }"#,
        )
        .unwrap();

        let cli = cli_for(&path);
        validate(&cli, &ValidateArgs::default()).unwrap();

        let strict = ValidateArgs {
            strict: true,
            ..ValidateArgs::default()
        };
        assert!(validate(&cli, &strict).is_err());
    }

    #[test]
    fn test_collect_warnings_for_snapshot_dir() {
        let mut config = WardenConfig::with_secrets(
            "access-secret-access-secret-access-secret",
            "refresh-secret-refresh-secret-refresh-secret",
        );
        assert!(collect_warnings(&config).is_empty());

        config.rbac.snapshot_path = Some("/nonexistent-warden-dir/rbac.json".into());
        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("does not exist"));
    }
}

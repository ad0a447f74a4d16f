// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `validate`: Validate a configuration file
//! - `version`: Show version information
//! - `gen-secret`: Generate a signing secret
//! - `token issue`: Mint a credential pair for a user
//! - `token inspect`: Verify a credential and print its claims

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use warden_config::LoggingSettings;

// =============================================================================
// Main CLI Structure
// =============================================================================

/// warden - identity and access control core
///
/// Issues, verifies, rotates and revokes bearer credentials and resolves
/// role-based permissions.
#[derive(Parser, Debug)]
#[command(
    name = "warden",
    author = "Sylvex <contact@sylvex.io>",
    version = warden_core::VERSION,
    about = "Identity and access control core",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "warden.yaml",
        env = "WARDEN_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error) [default: from config, else info]
    #[arg(short, long, env = "WARDEN_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format [default: from config, else text]
    #[arg(long, env = "WARDEN_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands for the warden CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Validate the configuration file
    ///
    /// Parses and validates the configuration file, then reports settings
    /// that are valid but unwise.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,

    /// Generate a random signing secret
    #[command(name = "gen-secret")]
    GenSecret(GenSecretArgs),

    /// Issue or inspect credentials
    Token(TokenArgs),
}

/// Subcommands of `token`.
#[derive(Subcommand, Debug, Clone)]
pub enum TokenCommands {
    /// Mint an access/refresh pair for a user
    Issue(IssueArgs),

    /// Verify a credential and print its claims
    Inspect(InspectArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation (secrets omitted)
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `gen-secret` command.
#[derive(Args, Debug, Clone)]
pub struct GenSecretArgs {
    /// Number of random bytes
    #[arg(short, long, default_value_t = 32)]
    pub bytes: usize,

    /// Print an access and a refresh secret as environment assignments
    #[arg(long)]
    pub env: bool,
}

/// Arguments for the `token` command.
#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommands,
}

/// Arguments for `token issue`.
#[derive(Args, Debug, Clone)]
pub struct IssueArgs {
    /// Subject user identifier
    #[arg(short, long)]
    pub user: u64,

    /// Display name embedded in the credentials
    #[arg(short, long)]
    pub name: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for `token inspect`.
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Credential to inspect
    pub token: String,

    /// Verify against the refresh secret instead of the access secret
    #[arg(long)]
    pub refresh: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<warden_config::LogFormat> for LogFormat {
    fn from(format: warden_config::LogFormat) -> Self {
        match format {
            warden_config::LogFormat::Text => LogFormat::Text,
            warden_config::LogFormat::Json => LogFormat::Json,
            warden_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective log level based on flags, then the config file.
    pub fn effective_log_level(&self, file: Option<&LoggingSettings>) -> String {
        if self.quiet {
            "warn".to_string()
        } else if self.verbose {
            "debug".to_string()
        } else if let Some(level) = &self.log_level {
            level.clone()
        } else {
            file.map(|settings| settings.level.clone())
                .unwrap_or_else(|| "info".to_string())
        }
    }

    /// Get the effective log format based on flags, then the config file.
    pub fn effective_log_format(&self, file: Option<&LoggingSettings>) -> LogFormat {
        self.log_format
            .or_else(|| file.map(|settings| settings.format.into()))
            .unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["warden", "validate", "--show-config"]);
        if let Commands::Validate(args) = cli.command {
            assert!(args.show_config);
            assert_eq!(args.format, OutputFormat::Text);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["warden", "-c", "/etc/warden/config.yaml", "version"]);
        assert_eq!(cli.config, PathBuf::from("/etc/warden/config.yaml"));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["warden"]).is_err());
    }

    #[test]
    fn test_gen_secret_defaults() {
        let cli = Cli::parse_from(["warden", "gen-secret"]);
        if let Commands::GenSecret(args) = cli.command {
            assert_eq!(args.bytes, 32);
            assert!(!args.env);
        } else {
            panic!("Expected GenSecret command");
        }
    }

    #[test]
    fn test_token_issue() {
        let cli = Cli::parse_from(["warden", "token", "issue", "--user", "42", "--name", "alice"]);
        match cli.command {
            Commands::Token(TokenArgs {
                command: TokenCommands::Issue(args),
            }) => {
                assert_eq!(args.user, 42);
                assert_eq!(args.name, "alice");
            }
            other => panic!("Expected token issue, got {:?}", other),
        }
    }

    #[test]
    fn test_token_inspect_refresh() {
        let cli = Cli::parse_from(["warden", "token", "inspect", "abc.def.ghi", "--refresh"]);
        match cli.command {
            Commands::Token(TokenArgs {
                command: TokenCommands::Inspect(args),
            }) => {
                assert_eq!(args.token, "abc.def.ghi");
                assert!(args.refresh);
            }
            other => panic!("Expected token inspect, got {:?}", other),
        }
    }

    #[test]
    fn test_log_level_precedence() {
        let file = LoggingSettings {
            level: "trace".to_string(),
            format: warden_config::LogFormat::Json,
        };

        let cli = Cli::parse_from(["warden", "version"]);
        assert_eq!(cli.effective_log_level(None), "info");
        assert_eq!(cli.effective_log_level(Some(&file)), "trace");
        assert_eq!(cli.effective_log_format(Some(&file)), LogFormat::Json);

        let cli = Cli::parse_from(["warden", "-l", "error", "--log-format", "compact", "version"]);
        assert_eq!(cli.effective_log_level(Some(&file)), "error");
        assert_eq!(cli.effective_log_format(Some(&file)), LogFormat::Compact);

        let cli = Cli::parse_from(["warden", "-q", "version"]);
        assert_eq!(cli.effective_log_level(Some(&file)), "warn");
    }
}

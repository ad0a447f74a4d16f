// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-bin
//!
//! CLI binary for the warden identity and access control core.
//!
//! - CLI argument parsing with clap
//! - Logging initialization
//! - Command implementations (validate, version, gen-secret, token)
//!
//! ## Usage
//!
//! ```bash
//! # Validate configuration
//! warden -c /etc/warden/warden.yaml validate
//!
//! # Generate secrets for the environment
//! warden gen-secret --env
//!
//! # Mint and inspect a credential pair
//! warden token issue --user 42 --name alice
//! warden token inspect <token>
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-config
//!
//! Configuration management for warden.
//!
//! ## Features
//!
//! - **Schema Definition**: credential windows and secrets, revocation
//!   backend, sweeper, RBAC seeding and logging
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: override secrets and selected values via
//!   `WARDEN_*` environment variables
//!
//! ## Quick Start
//!
//! ```no_run
//! use warden_config::load_config;
//!
//! let config = load_config("warden.yaml").unwrap();
//! println!("Access window: {:?}", config.access.ttl);
//! ```
//!
//! Values in config files can reference environment variables:
//!
//! ```yaml
//! access:
//!   secret: "${ACCESS_SECRET}"
//! revocation:
//!   backend: "${REVOCATION_BACKEND:memory}"
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader};
pub use schema::{
    CredentialSettings, LogFormat, LoggingSettings, RbacSettings, RevocationBackend,
    RevocationSettings, SigningAlgorithm, SweeperSettings, WardenConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

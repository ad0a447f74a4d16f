// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-core
//!
//! Core identifiers and the unified error hierarchy for the warden identity
//! and access control core.
//!
//! This crate is the leaf of the workspace and is shared by every other
//! component:
//!
//! - **Types**: `UserId`, `TokenId`, `RoleId`, `PermissionId`, `TokenKind`
//! - **Error**: `WardenError` and the per-concern error enums
//!
//! ## Example
//!
//! ```
//! use warden_core::error::{CredentialError, WardenError};
//! use warden_core::types::{TokenId, UserId};
//!
//! let user = UserId::new(42);
//! assert_eq!(user.to_string(), "42");
//!
//! let err: WardenError = CredentialError::blacklisted(TokenId::new("abc")).into();
//! assert!(err.is_security_event());
//! assert!(!err.is_retryable());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod types;

pub use error::{
    AccessError, CredentialError, RevocationError, SessionError, WardenError, WardenResult,
};
pub use types::{PermissionId, RoleId, TokenId, TokenKind, UserId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

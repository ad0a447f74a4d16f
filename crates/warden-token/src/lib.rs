// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-token
//!
//! Bearer credential handling for warden.
//!
//! ## Components
//!
//! - **Codec** ([`TokenCodec`]): signs and verifies time-bound claims, one
//!   codec per credential class
//! - **Revocation** ([`RevocationRegistry`]): in-process, external and hybrid
//!   backends
//! - **Sessions** ([`SessionTable`]): one active refresh credential per user
//! - **Sweeper** ([`Sweeper`]): periodic purge of expired in-process entries
//! - **Lifecycle** ([`TokenLifecycle`]): issue, verify, refresh and revoke
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_config::WardenConfig;
//! use warden_core::UserId;
//! use warden_token::{MemoryRegistry, SessionTable, TokenLifecycle};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WardenConfig::with_secrets(
//!     "access-secret-0123456789abcdef0123456789",
//!     "refresh-secret-0123456789abcdef012345678",
//! );
//! let lifecycle = TokenLifecycle::from_config(
//!     &config,
//!     Arc::new(MemoryRegistry::new(1024)),
//!     Arc::new(SessionTable::new()),
//! )?;
//!
//! let pair = lifecycle.issue(UserId::new(42), "alice")?;
//! let claims = lifecycle.verify_access(&pair.access_token).await?;
//! assert_eq!(claims.sub, UserId::new(42));
//!
//! lifecycle.revoke(&pair.access_token).await?;
//! assert!(lifecycle.verify_access(&pair.access_token).await.is_err());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod claims;
pub mod codec;
pub mod context;
pub mod lifecycle;
pub mod revocation;
pub mod session;
pub mod sweeper;

pub use claims::{Claims, TokenPair};
pub use codec::{generate_token_id, CodecConfig, IssuedCredential, TokenCodec};
pub use context::{extract_bearer_token, RequestContext};
pub use lifecycle::{TokenLifecycle, SECURITY_TARGET};
pub use revocation::{
    build_registry, ExternalRegistry, HybridRegistry, KeyValueStore, MemoryRegistry,
    RegistryHandle, RevocationRegistry, StoreError,
};
pub use session::{SessionRecord, SessionTable};
pub use sweeper::{Sweep, Sweeper};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-service
//!
//! The access service: one handle over the token lifecycle manager and the
//! authorization resolver, as consumed by request middleware.
//!
//! ```text
//! ┌──────────────────────── AccessService ─────────────────────────┐
//! │  TokenLifecycle                       AuthorizationResolver    │
//! │  ├── TokenCodec (access, refresh)     └── RoleStore            │
//! │  ├── RevocationRegistry                   └── RbacRepository   │
//! │  └── SessionTable                                              │
//! │                                                                │
//! │  Sweeper ── purges registry cache + sessions on an interval    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use warden_config::WardenConfig;
//! use warden_core::UserId;
//! use warden_rbac::ADMIN_ROLE_ID;
//! use warden_service::AccessService;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> warden_core::WardenResult<()> {
//! let config = WardenConfig::with_secrets(
//!     "an-access-secret-of-at-least-32-bytes",
//!     "a-refresh-secret-of-at-least-32-bytes",
//! );
//! let service = AccessService::from_config(config).await?;
//!
//! let user = UserId::new(7);
//! let pair = service.issue(user, "admin")?;
//! service.assign_role(user, ADMIN_ROLE_ID)?;
//!
//! let context = service
//!     .authenticate(&format!("Bearer {}", pair.access_token))
//!     .await?;
//! service.authorize(&context, "/anything", "DELETE")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod builder;
pub mod service;

pub use builder::AccessServiceBuilder;
pub use service::AccessService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

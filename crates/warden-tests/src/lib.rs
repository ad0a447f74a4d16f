// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden Integration Tests
//!
//! Integration tests for the warden identity and access control core, and
//! the shared utilities they use.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Pre-built configurations, services and role stores
//!   - `mocks`: In-memory key-value store and RBAC repository with error injection
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p warden-tests
//! cargo test -p warden-tests --test integration_token
//! cargo test -p warden-tests --test integration_concurrency
//! ```
//!
//! ## Test Categories
//!
//! - `integration_token.rs`: codec, revocation backends, rotation, expiry
//! - `integration_rbac.rs`: role store, resolver cache, snapshots
//! - `integration_service.rs`: end-to-end scenarios through `AccessService`
//! - `integration_concurrency.rs`: concurrent rotation, revocation and
//!   randomized role assignment

pub mod common;

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for warden.
//!
//! Every failure in the identity and access core resolves to a negative
//! answer returned to the caller. Nothing is retried internally and nothing
//! is swallowed into a default "valid" or "permitted" result.
//!
//! # Error Hierarchy
//!
//! ```text
//! WardenError (root)
//! ├── CredentialError  - Malformed, Expired, Blacklisted
//! ├── SessionError     - NotFound, Expired, Superseded
//! ├── RevocationError  - StoreUnavailable, CapacityExceeded
//! ├── AccessError      - RoleNotFound, PermissionNotFound, AlreadyExists, Forbidden
//! ├── Config           - invalid configuration
//! └── Internal         - unexpected failures (signing, serialization)
//! ```
//!
//! # Examples
//!
//! ```
//! use warden_core::error::{RevocationError, WardenError};
//!
//! let error = RevocationError::store_unavailable("connection refused");
//! let error: WardenError = error.into();
//! assert!(error.is_retryable());
//! assert_eq!(error.status_code(), 503);
//! ```

use thiserror::Error;

use crate::types::{PermissionId, RoleId, TokenId, UserId};

/// Result type alias for warden operations.
pub type WardenResult<T> = Result<T, WardenError>;

// =============================================================================
// WardenError - Root Error Type
// =============================================================================

/// The root error type for warden.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Credential verification failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Session lookup or mutation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Revocation registry failure.
    #[error(transparent)]
    Revocation(#[from] RevocationError),

    /// Role/permission administration or authorization failure.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// Unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl WardenError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller may retry the operation.
    ///
    /// Only transient external-store failures qualify. Credential errors are
    /// never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WardenError::Revocation(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns `true` if this error should be logged as a security event.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            WardenError::Credential(CredentialError::Blacklisted { .. })
        )
    }

    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            WardenError::Credential(e) => e.error_code(),
            WardenError::Session(e) => e.error_code(),
            WardenError::Revocation(e) => e.error_code(),
            WardenError::Access(e) => e.error_code(),
            WardenError::Config { .. } => "CONFIG_ERROR",
            WardenError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code a transport layer should map this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            WardenError::Credential(_) => 401,
            WardenError::Session(SessionError::NotFound { .. }) => 404,
            WardenError::Session(_) => 401,
            WardenError::Revocation(RevocationError::StoreUnavailable { .. }) => 503,
            WardenError::Revocation(RevocationError::CapacityExceeded { .. }) => 503,
            WardenError::Access(AccessError::Forbidden { .. }) => 403,
            WardenError::Access(_) => 422,
            WardenError::Config { .. } => 500,
            WardenError::Internal { .. } => 500,
        }
    }
}

// =============================================================================
// CredentialError
// =============================================================================

/// Errors produced while verifying a presented credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Structurally invalid or signature mismatch.
    #[error("Malformed credential: {reason}")]
    Malformed {
        /// What was wrong with the credential.
        reason: String,
    },

    /// The credential is past its expiry.
    #[error("Credential has expired")]
    Expired,

    /// The credential was explicitly revoked.
    #[error("Credential has been revoked: {token_id}")]
    Blacklisted {
        /// The revoked token identifier.
        token_id: TokenId,
    },
}

impl CredentialError {
    /// Creates a malformed credential error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Creates a blacklisted credential error.
    pub fn blacklisted(token_id: TokenId) -> Self {
        Self::Blacklisted { token_id }
    }

    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            CredentialError::Malformed { .. } => "MALFORMED_CREDENTIAL",
            CredentialError::Expired => "CREDENTIAL_EXPIRED",
            CredentialError::Blacklisted { .. } => "CREDENTIAL_BLACKLISTED",
        }
    }
}

// =============================================================================
// SessionError
// =============================================================================

/// Session table errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No session exists for the user.
    #[error("Session not found for user {user_id}")]
    NotFound {
        /// The user whose session was requested.
        user_id: UserId,
    },

    /// The session existed but had expired; it has been removed.
    #[error("Session expired for user {user_id}")]
    Expired {
        /// The user whose session expired.
        user_id: UserId,
    },

    /// The session no longer names the expected refresh token.
    #[error("Session for user {user_id} was superseded")]
    Superseded {
        /// The user whose session moved on.
        user_id: UserId,
    },
}

impl SessionError {
    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotFound { .. } => "SESSION_NOT_FOUND",
            SessionError::Expired { .. } => "SESSION_EXPIRED",
            SessionError::Superseded { .. } => "SESSION_SUPERSEDED",
        }
    }
}

// =============================================================================
// RevocationError
// =============================================================================

/// Revocation registry errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RevocationError {
    /// The external store could not be reached or answered with an error.
    #[error("Revocation store unavailable: {message}")]
    StoreUnavailable {
        /// Error message.
        message: String,
    },

    /// The in-process registry is full of live entries.
    #[error("Revocation registry is full ({capacity} live entries)")]
    CapacityExceeded {
        /// Configured maximum number of entries.
        capacity: usize,
    },
}

impl RevocationError {
    /// Creates a store unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if the operation may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RevocationError::StoreUnavailable { .. })
    }

    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            RevocationError::StoreUnavailable { .. } => "REVOCATION_STORE_UNAVAILABLE",
            RevocationError::CapacityExceeded { .. } => "REVOCATION_CAPACITY_EXCEEDED",
        }
    }
}

// =============================================================================
// AccessError
// =============================================================================

/// Role/permission administration and authorization errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// The referenced role does not exist.
    #[error("Role not found: {role_id}")]
    RoleNotFound {
        /// The missing role.
        role_id: RoleId,
    },

    /// The referenced permission does not exist.
    #[error("Permission not found: {permission_id}")]
    PermissionNotFound {
        /// The missing permission.
        permission_id: PermissionId,
    },

    /// An entity with the same identifier is already registered.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Kind of entity ("role" or "permission").
        entity: &'static str,
        /// The duplicated identifier.
        id: u64,
    },

    /// The user may not perform the action on the resource.
    #[error("User {user_id} may not {action} {resource}")]
    Forbidden {
        /// The requesting user.
        user_id: UserId,
        /// The requested resource.
        resource: String,
        /// The requested action.
        action: String,
    },
}

impl AccessError {
    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::RoleNotFound { .. } => "ROLE_NOT_FOUND",
            AccessError::PermissionNotFound { .. } => "PERMISSION_NOT_FOUND",
            AccessError::AlreadyExists { .. } => "ALREADY_EXISTS",
            AccessError::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

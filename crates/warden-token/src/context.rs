// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed request context.
//!
//! Populated once by access-credential verification and passed explicitly
//! down the call chain.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{TokenId, UserId};

use crate::claims::Claims;

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Authenticated user.
    pub user_id: UserId,
    /// Display name from the credential.
    pub username: String,
    /// Identifier of the access credential presented.
    pub token_id: TokenId,
    /// Request ID for tracing.
    pub request_id: Uuid,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
}

impl RequestContext {
    /// Creates a context from verified claims.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.name.clone(),
            token_id: claims.jti.clone(),
            request_id: Uuid::now_v7(),
            client_ip: None,
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Extracts the credential from an `Authorization: Bearer <token>` value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_from_claims() {
        let claims = Claims::new(
            UserId::new(42),
            "alice",
            TokenId::new("jti-1"),
            "warden",
            Duration::from_secs(60),
        );
        let ctx = RequestContext::from_claims(&claims)
            .with_client_ip("10.0.0.1".parse().unwrap());

        assert_eq!(ctx.user_id, UserId::new(42));
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.token_id.as_str(), "jti-1");
        assert!(ctx.client_ip.is_some());
    }

    #[test]
    fn test_request_ids_differ() {
        let claims = Claims::new(UserId::new(1), "u", TokenId::new("t"), "w", Duration::from_secs(1));
        let a = RequestContext::from_claims(&claims);
        let b = RequestContext::from_claims(&claims);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("bearer  abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential claims and token pairs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::{TokenId, UserId};

/// Claims carried by every access and refresh credential.
///
/// Both credential classes share this layout; they differ only in the secret
/// they are signed with and their validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject. Serialized as a decimal string.
    #[serde(with = "subject_serde")]
    pub sub: UserId,

    /// Unique token identifier, the revocation key.
    pub jti: TokenId,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issuer.
    pub iss: String,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// Owner's display name.
    pub name: String,
}

impl Claims {
    /// Creates claims valid from now for `window`.
    pub fn new(
        sub: UserId,
        name: impl Into<String>,
        jti: TokenId,
        issuer: impl Into<String>,
        window: Duration,
    ) -> Self {
        let now = Utc::now().timestamp();
        let window = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);

        Self {
            sub,
            jti,
            iat: now,
            exp: now.saturating_add(window),
            iss: issuer.into(),
            name: name.into(),
        }
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    /// Returns the token identifier.
    pub fn token_id(&self) -> &TokenId {
        &self.jti
    }

    /// Returns `true` if the credential is past its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issue time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Returns the instant the credential stops being accepted.
    ///
    /// Verification compares whole seconds, so a credential is still
    /// accepted throughout the second named by `exp`.
    pub fn accepted_until(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp.saturating_add(1), 0)
    }

    /// Returns how long the credential remains valid, or `None` once expired.
    ///
    /// Measured up to [`Self::accepted_until`] and rounded up to whole
    /// seconds, so a revocation entry sized from it outlives the credential.
    pub fn remaining_validity(&self) -> Option<Duration> {
        remaining_until(self.accepted_until()?, Utc::now())
    }
}

/// Whole seconds from `now` until `until`, rounded up; `None` once passed.
pub(crate) fn remaining_until(until: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    let millis = (until - now).num_milliseconds();
    if millis <= 0 {
        return None;
    }
    let secs = u64::try_from(millis).ok()?.div_ceil(1000);
    Some(Duration::from_secs(secs))
}

// =============================================================================
// TokenPair
// =============================================================================

/// An access and a refresh credential minted by one issuance call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access credential.
    pub access_token: String,
    /// Refresh credential.
    pub refresh_token: String,
    /// Access credential expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh credential expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// Token type for the `Authorization` header.
    pub token_type: String,
}

impl TokenPair {
    /// Seconds until the access credential expires, as reported to clients.
    pub fn expires_in(&self) -> i64 {
        (self.access_expires_at - Utc::now()).num_seconds().max(0)
    }
}

mod subject_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use warden_core::UserId;

    pub fn serialize<S>(user: &UserId, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(user)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<UserId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom(format!("subject is not a user id: {}", s)))
    }
}

// =============================================================================
// Tests
// =============================================================================

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token lifecycle manager.
//!
//! Composes the two credential codecs, the revocation registry and the
//! session table into issue, verify, refresh and revoke.
//!
//! # Rotation
//!
//! ```text
//! refresh(R) ── verify R ── session names R? ── blacklist R ── mint pair ── CAS session R -> R'
//!                  │              │                  │                         │
//!               Malformed     NotFound/Expired    StoreUnavailable        Superseded
//!               Expired       Blacklisted                                 -> Blacklisted
//!               Blacklisted
//! ```
//!
//! Each step is atomic on its own structure only. A failure after the old
//! refresh credential is blacklisted leaves the user needing to log in
//! again, but never allows the old credential to be used twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use warden_config::WardenConfig;
use warden_core::{
    CredentialError, SessionError, TokenId, TokenKind, UserId, WardenError, WardenResult,
};

use crate::claims::{remaining_until, Claims, TokenPair};
use crate::codec::{CodecConfig, IssuedCredential, TokenCodec};
use crate::revocation::RevocationRegistry;
use crate::session::SessionTable;

/// Tracing target for security-relevant events.
pub const SECURITY_TARGET: &str = "warden::security";

/// Issues, verifies, rotates and revokes access/refresh credential pairs.
#[derive(Clone)]
pub struct TokenLifecycle {
    access: TokenCodec,
    refresh: TokenCodec,
    registry: Arc<dyn RevocationRegistry>,
    sessions: Arc<SessionTable>,
}

impl TokenLifecycle {
    /// Creates a lifecycle manager from its parts.
    pub fn new(
        access: TokenCodec,
        refresh: TokenCodec,
        registry: Arc<dyn RevocationRegistry>,
        sessions: Arc<SessionTable>,
    ) -> WardenResult<Self> {
        if access.kind() != TokenKind::Access || refresh.kind() != TokenKind::Refresh {
            return Err(WardenError::config(
                "access and refresh codecs were supplied in the wrong order",
            ));
        }

        Ok(Self {
            access,
            refresh,
            registry,
            sessions,
        })
    }

    /// Creates a lifecycle manager with codecs built from `config`.
    pub fn from_config(
        config: &WardenConfig,
        registry: Arc<dyn RevocationRegistry>,
        sessions: Arc<SessionTable>,
    ) -> WardenResult<Self> {
        let access = TokenCodec::new(CodecConfig::from_settings(
            TokenKind::Access,
            &config.access,
            &config.issuer,
        ))?;
        let refresh = TokenCodec::new(CodecConfig::from_settings(
            TokenKind::Refresh,
            &config.refresh,
            &config.issuer,
        ))?;

        Self::new(access, refresh, registry, sessions)
    }

    /// Returns the access codec.
    pub fn access_codec(&self) -> &TokenCodec {
        &self.access
    }

    /// Returns the refresh codec.
    pub fn refresh_codec(&self) -> &TokenCodec {
        &self.refresh
    }

    /// Returns the session table.
    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    /// Returns the revocation registry.
    pub fn registry(&self) -> &Arc<dyn RevocationRegistry> {
        &self.registry
    }

    // =========================================================================
    // Issue
    // =========================================================================

    /// Issues a fresh pair and creates (or replaces) the user's session.
    pub fn issue(&self, user_id: UserId, name: &str) -> WardenResult<TokenPair> {
        let (pair, refresh_id) = self.mint_pair(user_id, name)?;
        self.sessions
            .create(user_id, refresh_id, self.refresh.window());

        info!(user_id = %user_id, "Issued token pair");
        Ok(pair)
    }

    fn mint_pair(&self, user_id: UserId, name: &str) -> WardenResult<(TokenPair, TokenId)> {
        let IssuedCredential {
            token: access_token,
            claims: access_claims,
        } = self.access.issue(user_id, name)?;
        let IssuedCredential {
            token: refresh_token,
            claims: refresh_claims,
        } = self.refresh.issue(user_id, name)?;

        let pair = TokenPair {
            access_token,
            refresh_token,
            access_expires_at: timestamp(access_claims.exp)?,
            refresh_expires_at: timestamp(refresh_claims.exp)?,
            token_type: "Bearer".to_string(),
        };

        Ok((pair, refresh_claims.jti))
    }

    // =========================================================================
    // Verify
    // =========================================================================

    /// Verifies an access credential and checks it has not been revoked.
    pub async fn verify_access(&self, token: &str) -> WardenResult<Claims> {
        self.verify_with(&self.access, token).await
    }

    /// Verifies a refresh credential and checks it has not been revoked.
    ///
    /// This does not consult the session table; [`Self::refresh`] does.
    pub async fn verify_refresh(&self, token: &str) -> WardenResult<Claims> {
        self.verify_with(&self.refresh, token).await
    }

    async fn verify_with(&self, codec: &TokenCodec, token: &str) -> WardenResult<Claims> {
        let claims = codec.verify(token)?;

        if self.registry.is_revoked(&claims.jti).await? {
            warn!(
                target: SECURITY_TARGET,
                kind = %codec.kind(),
                user_id = %claims.sub,
                token_id = %claims.jti,
                "Revoked credential presented"
            );
            return Err(CredentialError::blacklisted(claims.jti).into());
        }

        debug!(kind = %codec.kind(), user_id = %claims.sub, "Credential verified");
        Ok(claims)
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Exchanges a refresh credential for a new pair.
    ///
    /// Rotation is one-shot: the presented credential is blacklisted before
    /// the new pair is returned, so presenting it again fails with
    /// [`CredentialError::Blacklisted`].
    pub async fn refresh(&self, refresh_token: &str) -> WardenResult<TokenPair> {
        let claims = self.verify_refresh(refresh_token).await?;
        let user_id = claims.sub;

        let session = self.sessions.get(user_id)?;
        if session.refresh_token_id != claims.jti {
            warn!(
                target: SECURITY_TARGET,
                user_id = %user_id,
                token_id = %claims.jti,
                "Superseded refresh credential presented"
            );
            return Err(CredentialError::blacklisted(claims.jti).into());
        }

        self.registry
            .add(&claims.jti, blacklist_ttl(&claims))
            .await?;

        let (pair, new_refresh_id) = self.mint_pair(user_id, &claims.name)?;

        match self.sessions.compare_and_rotate(
            user_id,
            &claims.jti,
            new_refresh_id,
            self.refresh.window(),
        ) {
            Ok(_) => {
                info!(user_id = %user_id, "Rotated token pair");
                Ok(pair)
            }
            Err(SessionError::Superseded { .. }) => {
                warn!(
                    target: SECURITY_TARGET,
                    user_id = %user_id,
                    token_id = %claims.jti,
                    "Concurrent reuse of refresh credential"
                );
                Err(CredentialError::blacklisted(claims.jti).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Revoke
    // =========================================================================

    /// Revokes an access or refresh credential.
    ///
    /// The token identifier is blacklisted for the credential's remaining
    /// validity. Revoking a refresh credential also ends the session it is
    /// bound to, if it is still the current one. Revoking an already
    /// expired credential succeeds without effect.
    pub async fn revoke(&self, token: &str) -> WardenResult<()> {
        let (claims, kind) = match self.access.verify(token) {
            Ok(claims) => (claims, TokenKind::Access),
            Err(CredentialError::Expired) => return Ok(()),
            Err(CredentialError::Malformed { .. }) => match self.refresh.verify(token) {
                Ok(claims) => (claims, TokenKind::Refresh),
                Err(CredentialError::Expired) => return Ok(()),
                Err(e) => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        };

        self.registry.add(&claims.jti, blacklist_ttl(&claims)).await?;

        let session_ended = kind == TokenKind::Refresh
            && self.sessions.delete_if_current(claims.sub, &claims.jti);

        info!(
            user_id = %claims.sub,
            kind = %kind,
            session_ended,
            "Revoked credential"
        );
        Ok(())
    }

    /// Ends the user's session.
    ///
    /// Access credentials already issued are not blacklisted; they stay
    /// valid until their natural expiry unless blocked with
    /// [`Self::blacklist`].
    pub fn revoke_all_for_user(&self, user_id: UserId) {
        let existed = self.sessions.delete(user_id);
        warn!(
            target: SECURITY_TARGET,
            user_id = %user_id,
            session_ended = existed,
            "Revoked all sessions for user"
        );
    }

    /// Blacklists a known token identifier for a credential expiring at
    /// `expires_at`.
    ///
    /// The entry is kept through the whole expiry second, which is the last
    /// one verification accepts. A credential already past it is a no-op.
    pub async fn blacklist(
        &self,
        token_id: &TokenId,
        expires_at: DateTime<Utc>,
    ) -> WardenResult<()> {
        let until = expires_at + chrono::Duration::seconds(1);
        let Some(ttl) = remaining_until(until, Utc::now()) else {
            return Ok(());
        };
        self.registry.add(token_id, ttl).await?;

        info!(token_id = %token_id, "Blacklisted token identifier");
        Ok(())
    }
}

impl std::fmt::Debug for TokenLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLifecycle")
            .field("access", &self.access)
            .field("refresh", &self.refresh)
            .field("registry", &self.registry.backend_name())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

fn blacklist_ttl(claims: &Claims) -> Duration {
    // Verified a moment ago; if the second rolled over, keep the minimum.
    claims
        .remaining_validity()
        .unwrap_or(Duration::from_secs(1))
}

fn timestamp(secs: i64) -> WardenResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| WardenError::internal(format!("timestamp out of range: {}", secs)))
}

// =============================================================================
// Tests
// =============================================================================

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session table: at most one active refresh credential per user.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_core::{SessionError, TokenId, UserId};

use crate::sweeper::Sweep;

/// The current session of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Owner of the session.
    pub user_id: UserId,
    /// Identifier of the refresh credential currently bound to the session.
    pub refresh_token_id: TokenId,
    /// When the session lapses.
    pub expires_at: DateTime<Utc>,
    /// When the session was created or last rotated.
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    fn new(user_id: UserId, refresh_token_id: TokenId, ttl: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            user_id,
            refresh_token_id,
            expires_at: expiry_from(created_at, ttl),
            created_at,
        }
    }

    /// Returns `true` if the session has lapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Returns `true` if the session has lapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

fn expiry_from(start: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| start.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Sessions keyed by user, behind a single reader/writer lock.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<UserId, SessionRecord>>,
}

impl SessionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session, replacing any existing one for the user.
    pub fn create(&self, user_id: UserId, refresh_token_id: TokenId, ttl: Duration) -> SessionRecord {
        let record = SessionRecord::new(user_id, refresh_token_id, ttl);
        let previous = self.sessions.write().insert(user_id, record.clone());
        debug!(
            user_id = %user_id,
            replaced = previous.is_some(),
            "Session created"
        );
        record
    }

    /// Returns the user's session.
    ///
    /// An expired record is deleted and reported as [`SessionError::Expired`].
    pub fn get(&self, user_id: UserId) -> Result<SessionRecord, SessionError> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read();
            match sessions.get(&user_id) {
                None => return Err(SessionError::NotFound { user_id }),
                Some(record) if !record.is_expired_at(now) => return Ok(record.clone()),
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write();
        let record = sessions
            .get(&user_id)
            .cloned()
            .ok_or(SessionError::NotFound { user_id })?;
        // Replaced by a fresh session between the two locks.
        if !record.is_expired_at(now) {
            return Ok(record);
        }
        sessions.remove(&user_id);
        Err(SessionError::Expired { user_id })
    }

    /// Binds a new refresh credential to an existing session.
    pub fn rotate(
        &self,
        user_id: UserId,
        new_refresh_token_id: TokenId,
        ttl: Duration,
    ) -> Result<SessionRecord, SessionError> {
        let mut sessions = self.sessions.write();
        if !sessions.contains_key(&user_id) {
            return Err(SessionError::NotFound { user_id });
        }

        let record = SessionRecord::new(user_id, new_refresh_token_id, ttl);
        sessions.insert(user_id, record.clone());
        Ok(record)
    }

    /// Rotates only if the session still names `expected`.
    ///
    /// Of several concurrent rotations presenting the same credential,
    /// exactly one succeeds; the others see [`SessionError::Superseded`].
    pub fn compare_and_rotate(
        &self,
        user_id: UserId,
        expected: &TokenId,
        new_refresh_token_id: TokenId,
        ttl: Duration,
    ) -> Result<SessionRecord, SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();

        let (expired, current) = match sessions.get(&user_id) {
            Some(record) => (
                record.is_expired_at(now),
                &record.refresh_token_id == expected,
            ),
            None => return Err(SessionError::NotFound { user_id }),
        };
        if expired {
            sessions.remove(&user_id);
            return Err(SessionError::Expired { user_id });
        }
        if !current {
            return Err(SessionError::Superseded { user_id });
        }

        let record = SessionRecord::new(user_id, new_refresh_token_id, ttl);
        sessions.insert(user_id, record.clone());
        Ok(record)
    }

    /// Deletes the user's session. Returns `true` if one existed.
    pub fn delete(&self, user_id: UserId) -> bool {
        self.sessions.write().remove(&user_id).is_some()
    }

    /// Deletes the session only if it is bound to `token_id`.
    pub fn delete_if_current(&self, user_id: UserId, token_id: &TokenId) -> bool {
        let mut sessions = self.sessions.write();
        let is_current = sessions
            .get(&user_id)
            .is_some_and(|record| &record.refresh_token_id == token_id);
        if is_current {
            sessions.remove(&user_id);
        }
        is_current
    }

    /// Returns the number of stored sessions, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Sweep for SessionTable {
    fn name(&self) -> &'static str {
        "sessions"
    }

    fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));
        before - sessions.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(3600);

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    fn token(s: &str) -> TokenId {
        TokenId::new(s)
    }

    #[test]
    fn test_create_and_get() {
        let table = SessionTable::new();
        let created = table.create(user(1), token("r1"), HOUR);

        let record = table.get(user(1)).unwrap();
        assert_eq!(record, created);
        assert_eq!(record.refresh_token_id, token("r1"));
        assert!(record.expires_at > record.created_at);
    }

    #[test]
    fn test_create_replaces() {
        let table = SessionTable::new();
        table.create(user(1), token("r1"), HOUR);
        table.create(user(1), token("r2"), HOUR);

        assert_eq!(table.get(user(1)).unwrap().refresh_token_id, token("r2"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let table = SessionTable::new();
        assert_eq!(
            table.get(user(9)),
            Err(SessionError::NotFound { user_id: user(9) })
        );
    }

    #[test]
    fn test_expired_session_deleted_on_read() {
        let table = SessionTable::new();
        table.create(user(1), token("r1"), Duration::ZERO);

        assert_eq!(
            table.get(user(1)),
            Err(SessionError::Expired { user_id: user(1) })
        );
        // Never resurrected.
        assert_eq!(
            table.get(user(1)),
            Err(SessionError::NotFound { user_id: user(1) })
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_rotate_requires_session() {
        let table = SessionTable::new();
        assert_eq!(
            table.rotate(user(1), token("r2"), HOUR),
            Err(SessionError::NotFound { user_id: user(1) })
        );

        table.create(user(1), token("r1"), HOUR);
        table.rotate(user(1), token("r2"), HOUR).unwrap();
        assert_eq!(table.get(user(1)).unwrap().refresh_token_id, token("r2"));
    }

    #[test]
    fn test_compare_and_rotate() {
        let table = SessionTable::new();
        table.create(user(1), token("r1"), HOUR);

        table
            .compare_and_rotate(user(1), &token("r1"), token("r2"), HOUR)
            .unwrap();
        assert_eq!(
            table.compare_and_rotate(user(1), &token("r1"), token("r3"), HOUR),
            Err(SessionError::Superseded { user_id: user(1) })
        );
        assert_eq!(table.get(user(1)).unwrap().refresh_token_id, token("r2"));
    }

    #[test]
    fn test_delete_if_current() {
        let table = SessionTable::new();
        table.create(user(1), token("r2"), HOUR);

        assert!(!table.delete_if_current(user(1), &token("r1")));
        assert!(table.get(user(1)).is_ok());

        assert!(table.delete_if_current(user(1), &token("r2")));
        assert!(table.get(user(1)).is_err());
        assert!(!table.delete(user(1)));
    }

    #[test]
    fn test_purge_expired() {
        let table = SessionTable::new();
        table.create(user(1), token("a"), Duration::ZERO);
        table.create(user(2), token("b"), HOUR);

        assert_eq!(table.purge_expired(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_concurrent_rotation_single_winner() {
        let table = Arc::new(SessionTable::new());
        table.create(user(1), token("r0"), HOUR);

        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let table = table.clone();
                    scope.spawn(move || {
                        table
                            .compare_and_rotate(
                                user(1),
                                &token("r0"),
                                TokenId::new(format!("r{}", i + 1)),
                                HOUR,
                            )
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });

        assert_eq!(winners, 1);
    }
}

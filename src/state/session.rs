use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// Authenticated browser or API session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token (32 hex characters).
    pub token: String,
    /// Owner of the session.
    pub username: String,
    /// Login time; the token expires one TTL later.
    pub issued_at: SystemTime,
}

impl Session {
    fn is_expired(&self, ttl: Duration) -> bool {
        // a clock that went backwards keeps the session alive
        self.issued_at.elapsed().is_ok_and(|age| age >= ttl)
    }
}

/// In-memory registry of issued session tokens.
///
/// Tokens expire `ttl` after they were issued. Expired entries are swept on
/// every login, so the registry stays bounded by the logins of one TTL window.
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionRegistry {
    /// Empty registry whose tokens live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Issue a fresh random token for `username`.
    pub fn issue(&self, username: &str) -> Session {
        self.sweep_expired();
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            username: username.to_owned(),
            issued_at: SystemTime::now(),
        };
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Session behind `token`, unless it is unknown or expired.
    pub fn resolve(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|entry| entry.value().clone())?;
        if session.is_expired(self.ttl) {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    /// Forget `token`, returning its session if it was known.
    pub fn revoke(&self, token: &str) -> Option<Session> {
        self.sessions.remove(token).map(|(_, session)| session)
    }

    /// Drop every session, returning how many were active.
    pub fn clear(&self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    /// Number of stored sessions, expired ones not yet swept included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn sweep_expired(&self) {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(self.ttl));
        let swept = before.saturating_sub(self.sessions.len());
        if swept > 0 {
            debug!(swept, "expired sessions swept");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn issued_tokens_resolve_until_revoked() {
        let registry = SessionRegistry::new(HOUR);
        let session = registry.issue("alice");
        assert_eq!(session.token.len(), 32);
        assert_eq!(registry.resolve(&session.token).unwrap().username, "alice");

        registry.revoke(&session.token);
        assert!(registry.resolve(&session.token).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let registry = SessionRegistry::new(HOUR);
        let a = registry.issue("alice");
        let b = registry.issue("bob");
        assert_ne!(a.token, b.token);
        assert_eq!(registry.clear(), 2);
        assert!(registry.resolve(&a.token).is_none());
    }

    #[test]
    fn expired_tokens_no_longer_resolve() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let session = registry.issue("alice");
        assert!(registry.resolve(&session.token).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn logins_sweep_expired_sessions() {
        let registry = SessionRegistry::new(Duration::ZERO);
        for _ in 0..5 {
            registry.issue("alice");
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn repeated_logins_keep_live_sessions() {
        let registry = SessionRegistry::new(HOUR);
        let first = registry.issue("alice");
        let second = registry.issue("alice");
        assert_eq!(registry.len(), 2);
        assert!(registry.resolve(&first.token).is_some());
        assert!(registry.resolve(&second.token).is_some());
    }
}

//! Opaque session tokens bound to user ids with a fixed time-to-live.

use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Key-value store for session bindings. A token maps to exactly one user
/// id; a user may hold any number of concurrent tokens.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<LruCache<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_sessions)
            .unwrap_or_else(|| NonZeroUsize::new(10_000).unwrap());

        Self {
            sessions: Arc::new(RwLock::new(LruCache::new(capacity))),
            ttl: Duration::hours(config.ttl_hours as i64),
        }
    }

    /// Mints a fresh random token and binds it to `user_id` for the
    /// configured TTL. Token material carries no identity information.
    pub fn mint(&self, user_id: Uuid) -> String {
        let token = Uuid::new_v4().to_string();
        let entry = SessionEntry {
            user_id,
            expires_at: Utc::now() + self.ttl,
        };

        self.sessions.write().put(token.clone(), entry);
        debug!("Minted session for user {}", user_id);

        token
    }

    /// Returns the bound user id, or `None` if the token is unknown or
    /// expired. Expired bindings are dropped on access.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let mut sessions = self.sessions.write();

        let entry = sessions.get(token)?.clone();
        if entry.is_expired() {
            sessions.pop(token);
            debug!("Session token expired");
            return None;
        }

        Some(entry.user_id)
    }

    /// Deletes the binding. Idempotent: revoking an absent token is a no-op.
    pub fn revoke(&self, token: &str) {
        if self.sessions.write().pop(token).is_some() {
            debug!("Revoked session token");
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.sessions.is_locked_exclusive()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

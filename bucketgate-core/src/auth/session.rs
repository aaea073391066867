//! Server-side session records and the process-wide session table

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// When a session stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum SessionExpiry {
    /// No fixed expiry; the session ends when the browser drops its cookie
    /// or on logout.
    BrowserSession,
    At(DateTime<Utc>),
}

/// Server-held proof of authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token handed to the client in a cookie
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expiry: SessionExpiry,
}

impl Session {
    /// Create a session issued at `now`. With `remember_for` the session
    /// expires at `now + remember_for`.
    pub fn issue(username: &str, now: DateTime<Utc>, remember_for: Option<Duration>) -> Self {
        let expiry = match remember_for {
            Some(lifetime) => SessionExpiry::At(now + lifetime),
            None => SessionExpiry::BrowserSession,
        };

        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            created_at: now,
            expiry,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            SessionExpiry::BrowserSession => false,
            SessionExpiry::At(at) => now >= at,
        }
    }

    /// Remaining lifetime for the cookie's `Max-Age`, `None` for browser
    /// sessions.
    pub fn max_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.expiry {
            SessionExpiry::BrowserSession => None,
            SessionExpiry::At(at) => Some((at - now).max(Duration::zero())),
        }
    }
}

/// Concurrency-safe session table keyed by token.
///
/// The table is unbounded. Browser sessions never expire server-side, so
/// [`SessionStore::purge_expired`] leaves them in place and each login that
/// is not followed by a logout keeps one entry until the process exits. Only
/// callers with valid credentials can add entries.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session);
    }

    /// Look up a live session. An expired one is evicted and `None` returned.
    pub async fn get_valid(&self, id: &str, now: DateTime<Utc>) -> Option<Session> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return None,
                Some(session) if !session.is_expired_at(now) => return Some(session.clone()),
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.get(id).is_some_and(|s| s.is_expired_at(now)) {
            sessions.remove(id);
            debug!("Evicted expired session");
        }
        None
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Drop every session that has expired by `now`; returns how many.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

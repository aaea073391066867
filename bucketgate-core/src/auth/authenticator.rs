//! Session-based authentication

use super::{CredentialStore, Session, SessionStore};
use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validates credentials, issues session tokens and answers "is this request
/// authenticated".
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionStore>,
    remember_for: Duration,
}

impl SessionAuthenticator {
    pub fn new(
        credentials: Arc<CredentialStore>,
        sessions: Arc<SessionStore>,
        remember_for: Duration,
    ) -> Self {
        Self {
            credentials,
            sessions,
            remember_for,
        }
    }

    /// Check the credentials and open a session. `remember_me` gives the
    /// session a fixed expiry of `remember_for`; otherwise it lasts until the
    /// browser drops the cookie.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Session, AuthError> {
        self.login_at(username, password, remember_me, Utc::now())
            .await
    }

    pub async fn login_at(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let Some(credential) = self.credentials.verify(username, password) else {
            warn!(username = %username, "Login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        };

        let session = Session::issue(
            &credential.username,
            now,
            remember_me.then_some(self.remember_for),
        );
        self.sessions.insert(session.clone()).await;

        info!(
            username = %session.username,
            remember_me,
            "User logged in"
        );
        Ok(session)
    }

    /// Whether `token` refers to a live session.
    pub async fn is_authenticated(&self, token: Option<&str>) -> bool {
        self.session(token).await.is_some()
    }

    /// The live session `token` refers to, if any.
    pub async fn session(&self, token: Option<&str>) -> Option<Session> {
        self.session_at(token, Utc::now()).await
    }

    pub async fn session_at(&self, token: Option<&str>, now: DateTime<Utc>) -> Option<Session> {
        let token = token.filter(|t| !t.is_empty())?;
        self.sessions.get_valid(token, now).await
    }

    /// Destroy the session `token` refers to. Unknown or missing tokens are
    /// not an error, so logging out twice is fine.
    pub async fn logout(&self, token: Option<&str>) {
        let Some(token) = token else {
            return;
        };

        match self.sessions.remove(token).await {
            Some(session) => info!(username = %session.username, "User logged out"),
            None => debug!("Logout for unknown or already closed session"),
        }
    }

    /// Sweep expired sessions; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.sessions.purge_expired(Utc::now()).await
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn remember_for(&self) -> Duration {
        self.remember_for
    }
}

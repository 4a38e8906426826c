//! In-memory session holder with refresh bookkeeping
//!
//! Holds the provider session for the running process:
//! - token retrieval for adapters that call the backend as the user
//! - "refresh due" checks against a configurable threshold (default 5 min)
//! - lifecycle notifications for subscribers

use parking_lot::RwLock;
use solace_core::identity::AuthChange;
use solace_domain::AuthSession;
use tokio::sync::broadcast;
use tracing::{debug, info};

const CHANGE_CAPACITY: usize = 16;

/// Current provider session, shared by the identity client and the stores
pub struct SessionManager {
    current: RwLock<Option<AuthSession>>,
    refresh_threshold_seconds: i64,
    changes: broadcast::Sender<AuthChange>,
}

impl SessionManager {
    #[must_use]
    pub fn new(refresh_threshold_seconds: i64) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { current: RwLock::new(None), refresh_threshold_seconds, changes }
    }

    /// Current session without any refresh
    #[must_use]
    pub fn current(&self) -> Option<AuthSession> {
        self.current.read().clone()
    }

    /// Access token of the current session, if any
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|session| session.access_token.clone())
    }

    /// Refresh token, when the session is due for a refresh
    ///
    /// `Some(None)` means a refresh is due but no refresh token is held.
    #[must_use]
    pub fn refresh_due(&self) -> Option<Option<String>> {
        let current = self.current.read();
        let session = current.as_ref()?;
        session.is_expired(self.refresh_threshold_seconds).then(|| session.refresh_token.clone())
    }

    /// Replace the session and notify subscribers
    pub fn store(&self, session: AuthSession, refreshed: bool) {
        let user_id = session.user.id.clone();
        debug!(
            user_id = %user_id,
            expires_in = ?session.seconds_until_expiry(),
            refreshed,
            "Session stored"
        );
        *self.current.write() = Some(session);

        let change = if refreshed {
            AuthChange::TokenRefreshed { user_id }
        } else {
            AuthChange::SignedIn { user_id }
        };
        let _ = self.changes.send(change);
    }

    /// Install a session recovered from the local cache; no notification
    pub fn restore(&self, session: AuthSession) {
        debug!(user_id = %session.user.id, "Session restored from cache");
        *self.current.write() = Some(session);
    }

    /// Drop the session without notifying; returns whether one was held
    pub fn discard(&self) -> bool {
        self.current.write().take().is_some()
    }

    /// Keep the session but swap in a newer copy of its user
    pub fn update_user(&self, user: solace_domain::Identity) {
        if let Some(session) = self.current.write().as_mut().filter(|s| s.user.id == user.id) {
            session.user = user;
        }
    }

    /// Drop the session; returns whether one was held
    pub fn clear(&self) -> bool {
        let had_session = self.current.write().take().is_some();
        if had_session {
            info!("Session cleared");
            let _ = self.changes.send(AuthChange::SignedOut);
        }
        had_session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("has_session", &self.current.read().is_some())
            .field("refresh_threshold_seconds", &self.refresh_threshold_seconds)
            .finish()
    }
}

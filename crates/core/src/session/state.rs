//! Auth state and its transition function

use solace_domain::{CanonicalUser, Role};

/// Snapshot of the session as the application sees it
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<CanonicalUser>,
    pub is_loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self { user: None, is_loading: true }
    }
}

/// Inputs that move the state
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    CheckStarted,
    Authenticated(CanonicalUser),
    Unauthenticated,
    /// The check ceiling fired; keep whatever was last written
    CheckTimedOut,
    /// A discarded check finished with nothing else running
    CheckSuperseded,
    /// A re-read of the current user; ignored if another user is now held
    UserRefreshed(CanonicalUser),
    SignedOut,
}

impl AuthState {
    #[must_use]
    pub fn apply(self, event: AuthEvent) -> Self {
        match event {
            AuthEvent::CheckStarted => Self { is_loading: true, ..self },
            AuthEvent::Authenticated(user) => Self { user: Some(user), is_loading: false },
            AuthEvent::Unauthenticated | AuthEvent::SignedOut => {
                Self { user: None, is_loading: false }
            }
            AuthEvent::CheckTimedOut | AuthEvent::CheckSuperseded => {
                Self { is_loading: false, ..self }
            }
            AuthEvent::UserRefreshed(user) => match &self.user {
                Some(current) if current.id == user.id => Self { user: Some(user), ..self },
                _ => self,
            },
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.user.as_ref().map_or(Role::Guest, |user| user.role)
    }
}

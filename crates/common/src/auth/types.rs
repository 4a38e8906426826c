//! Persisted credential types and storage keys

use serde::{Deserialize, Serialize};

/// Storage key for the access token
pub const AUTH_TOKEN_KEY: &str = "solace.auth_token";

/// Storage key for the serialized canonical user
pub const AUTH_USER_KEY: &str = "solace.auth_user";

/// Storage key for the role string
pub const USER_ROLE_KEY: &str = "solace.user_role";

/// All keys owned by a credential store, in write order
pub const CREDENTIAL_KEYS: [&str; 3] = [AUTH_TOKEN_KEY, AUTH_USER_KEY, USER_ROLE_KEY];

/// Locally cached credentials
///
/// `user` is an opaque JSON document; this crate does not know the shape of
/// the canonical user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Provider access token
    pub token: String,
    /// Serialized canonical user
    pub user: String,
    /// Role string as last resolved
    pub role: String,
}

impl StoredCredentials {
    /// Build a credential triple
    pub fn new(token: impl Into<String>, user: impl Into<String>, role: impl Into<String>) -> Self {
        Self { token: token.into(), user: user.into(), role: role.into() }
    }
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("token", &"[redacted]")
            .field("user_len", &self.user.len())
            .field("role", &self.role)
            .finish()
    }
}

//! Identity provider records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;
use super::JsonMap;

/// Authentication record owned by the identity provider
///
/// Read-only to Solace; re-obtained on every session check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Raw provider metadata, as declared at sign-up or via `update_user`
    #[serde(default, rename = "user_metadata")]
    pub metadata: JsonMap,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Active provider session
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Identity,
}

impl AuthSession {
    /// True when the access token expires within `threshold_seconds`
    ///
    /// A session without an expiry is treated as live.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at,
            None => false,
        }
    }

    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("user", &self.user.id)
            .finish()
    }
}

/// New account request
#[derive(Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub full_name: Option<String>,
    /// Extra provider metadata merged under the role/name keys
    pub metadata: JsonMap,
}

impl SignUpRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role,
            full_name: None,
            metadata: JsonMap::new(),
        }
    }

    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Metadata sent to the provider with the sign-up call
    #[must_use]
    pub fn provider_metadata(&self) -> JsonMap {
        let mut metadata = self.metadata.clone();
        metadata.insert("role".into(), self.role.as_str().into());
        if let Some(name) = &self.full_name {
            metadata.insert("full_name".into(), name.clone().into());
        }
        metadata
    }
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Provider response to a sign-up
///
/// `session` is absent when the provider requires email confirmation first.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub identity: Identity,
    pub session: Option<AuthSession>,
}

//! Port interface for the external identity/session provider

use async_trait::async_trait;
use solace_domain::{AuthSession, Identity, JsonMap, Result, SignUpOutcome, SignUpRequest};
use tokio::sync::broadcast;

/// Session lifecycle notifications emitted by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn { user_id: String },
    TokenRefreshed { user_id: String },
    SignedOut,
}

/// Identity provider: issues sessions and stores account metadata
///
/// Credential rejections are reported as `SolaceError::InvalidCredentials`,
/// network failures as `SolaceError::TransientSource`, and a missing backend
/// configuration as `SolaceError::Config`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session, if one is held and still valid
    async fn get_session(&self) -> Result<Option<AuthSession>>;

    /// Fetch the user that owns `access_token` (verifies the token)
    async fn get_user(&self, access_token: &str) -> Result<Identity>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome>;

    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Merge `metadata` into the provider-side user metadata
    async fn update_user(&self, access_token: &str, metadata: &JsonMap) -> Result<Identity>;

    async fn reset_password_for_email(&self, email: &str) -> Result<()>;

    /// Adopt a verified token as the held session, without notifying
    ///
    /// Later calls made on the user's behalf carry this token.
    fn restore_session(&self, access_token: &str, identity: &Identity);

    /// Drop any held session locally, without contacting the provider
    fn forget_session(&self);

    /// Subscribe to session lifecycle changes
    fn auth_changes(&self) -> broadcast::Receiver<AuthChange>;
}

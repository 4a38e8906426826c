//! Trait for local credential persistence
//!
//! Abstracts the storage backend so the session resolver can be tested with
//! an in-memory store and run against the platform keychain in production.

use crate::error::CommonResult;

use super::types::StoredCredentials;

/// Persisted token, serialized user and role for the signed-in user
///
/// Methods are synchronous: sign-out must clear the local cache before it
/// awaits the provider's sign-out call.
pub trait CredentialStore: Send + Sync {
    /// Load the cached credentials
    ///
    /// Returns `Ok(None)` when nothing is cached or when only part of the
    /// triple is present.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    fn load(&self) -> CommonResult<Option<StoredCredentials>>;

    /// Persist all three values
    ///
    /// # Errors
    /// Returns error if any value cannot be written
    fn save(&self, credentials: &StoredCredentials) -> CommonResult<()>;

    /// Remove all three values (idempotent)
    ///
    /// # Errors
    /// Returns the first backend failure after attempting every key
    fn clear(&self) -> CommonResult<()>;
}

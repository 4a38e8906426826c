//! Credential storage in the platform keychain
//!
//! Each of the three credential values is a separate keychain entry under a
//! single service name (macOS Keychain, Windows Credential Manager, Linux
//! Secret Service via the `keyring` crate).

use keyring::Entry;
use tracing::{debug, warn};

use super::traits::CredentialStore;
use super::types::{StoredCredentials, AUTH_TOKEN_KEY, AUTH_USER_KEY, CREDENTIAL_KEYS, USER_ROLE_KEY};
use crate::error::{CommonError, CommonResult};

/// Keychain-backed [`CredentialStore`]
pub struct KeychainCredentialStore {
    service_name: String,
}

impl KeychainCredentialStore {
    /// Create a store namespaced under `service_name` (e.g. `"Solace.auth"`)
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Service name used for every entry
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> CommonResult<Entry> {
        Entry::new(&self.service_name, key).map_err(|e| {
            CommonError::persistence_op("keychain_entry", format!("{key}: {e}"))
        })
    }

    fn get(&self, key: &str) -> CommonResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CommonError::persistence_op("keychain_read", format!("{key}: {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> CommonResult<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| CommonError::persistence_op("keychain_write", format!("{key}: {e}")))
    }

    fn delete(&self, key: &str) -> CommonResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CommonError::persistence_op("keychain_delete", format!("{key}: {e}"))),
        }
    }
}

impl CredentialStore for KeychainCredentialStore {
    fn load(&self) -> CommonResult<Option<StoredCredentials>> {
        let token = self.get(AUTH_TOKEN_KEY)?;
        let user = self.get(AUTH_USER_KEY)?;
        let role = self.get(USER_ROLE_KEY)?;

        match (token, user, role) {
            (Some(token), Some(user), Some(role)) => {
                debug!(service = %self.service_name, "Loaded cached credentials");
                Ok(Some(StoredCredentials { token, user, role }))
            }
            (None, None, None) => Ok(None),
            _ => {
                warn!(service = %self.service_name, "Ignoring partially cached credentials");
                Ok(None)
            }
        }
    }

    fn save(&self, credentials: &StoredCredentials) -> CommonResult<()> {
        self.set(AUTH_TOKEN_KEY, &credentials.token)?;
        self.set(AUTH_USER_KEY, &credentials.user)?;
        self.set(USER_ROLE_KEY, &credentials.role)?;
        debug!(service = %self.service_name, role = %credentials.role, "Cached credentials");
        Ok(())
    }

    fn clear(&self) -> CommonResult<()> {
        let mut first_error = None;
        for key in CREDENTIAL_KEYS {
            if let Err(err) = self.delete(key) {
                warn!(service = %self.service_name, key, error = %err, "Failed to clear credential");
                first_error.get_or_insert(err);
            }
        }
        debug!(service = %self.service_name, "Cleared cached credentials");
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for KeychainCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainCredentialStore").field("service_name", &self.service_name).finish()
    }
}

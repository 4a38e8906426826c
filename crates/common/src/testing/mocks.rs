//! Mock implementations of common traits
//!
//! Provides in-memory objects for testing purposes.

#![allow(clippy::missing_errors_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::auth::{
    CredentialStore, StoredCredentials, AUTH_TOKEN_KEY, AUTH_USER_KEY, CREDENTIAL_KEYS,
    USER_ROLE_KEY,
};
use crate::error::{CommonError, CommonResult};

/// In-memory [`CredentialStore`]
///
/// Values are kept per key, like the keychain store, so partially written
/// state can be simulated with [`MemoryCredentialStore::set_raw`]. Clones
/// share the same backing map.
#[derive(Clone, Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
    clears: Arc<AtomicUsize>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with credentials
    pub fn with_credentials(credentials: &StoredCredentials) -> Self {
        let store = Self::new();
        store.write_all(credentials);
        store
    }

    /// Write a single raw key, bypassing the triple
    pub fn set_raw(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    /// Make every subsequent `load` fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Whether any credential key is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let entries = self.entries.lock();
        CREDENTIAL_KEYS.iter().all(|key| !entries.contains_key(*key))
    }

    /// Number of successful `save` calls
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of `clear` calls
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    fn write_all(&self, credentials: &StoredCredentials) {
        let mut entries = self.entries.lock();
        entries.insert(AUTH_TOKEN_KEY.to_string(), credentials.token.clone());
        entries.insert(AUTH_USER_KEY.to_string(), credentials.user.clone());
        entries.insert(USER_ROLE_KEY.to_string(), credentials.role.clone());
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> CommonResult<Option<StoredCredentials>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CommonError::persistence_op("load", "simulated read failure"));
        }

        let entries = self.entries.lock();
        let token = entries.get(AUTH_TOKEN_KEY).cloned();
        let user = entries.get(AUTH_USER_KEY).cloned();
        let role = entries.get(USER_ROLE_KEY).cloned();

        Ok(match (token, user, role) {
            (Some(token), Some(user), Some(role)) => Some(StoredCredentials { token, user, role }),
            _ => None,
        })
    }

    fn save(&self, credentials: &StoredCredentials) -> CommonResult<()> {
        self.write_all(credentials);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> CommonResult<()> {
        let mut entries = self.entries.lock();
        for key in CREDENTIAL_KEYS {
            entries.remove(key);
        }
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoredCredentials {
        StoredCredentials::new("tok", r#"{"id":"u1"}"#, "counselor")
    }

    #[test]
    fn save_then_load_returns_triple() {
        let store = MemoryCredentialStore::new();
        store.save(&sample()).unwrap();

        assert_eq!(store.load().unwrap(), Some(sample()));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn partial_state_loads_as_none() {
        let store = MemoryCredentialStore::new();
        store.set_raw(AUTH_TOKEN_KEY, "tok");

        assert_eq!(store.load().unwrap(), None);
        assert!(!store.is_empty());
    }

    #[test]
    fn clear_removes_every_key_and_is_idempotent() {
        let store = MemoryCredentialStore::with_credentials(&sample());
        store.clear().unwrap();
        store.clear().unwrap();

        assert!(store.is_empty());
        assert_eq!(store.clear_count(), 2);
    }

    #[test]
    fn simulated_read_failure_surfaces_as_persistence_error() {
        let store = MemoryCredentialStore::with_credentials(&sample());
        store.fail_reads(true);

        assert!(matches!(store.load(), Err(CommonError::Persistence { .. })));
    }
}

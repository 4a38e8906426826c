//! Shared test helpers for `solace-core` integration tests.
//!
//! In-memory implementations of every core port plus a [`Harness`] that
//! wires them into an [`AuthContext`] with short timeouts.

#![allow(dead_code, unused_imports)]

pub mod identity;
pub mod realtime;
pub mod stores;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use solace_common::testing::MemoryCredentialStore;
use solace_common::StoredCredentials;
use solace_core::counselor::CounselorProfileSync;
use solace_core::profile::ProfileReconciler;
use solace_core::session::{AuthContext, Navigator, SessionResolver};
use solace_domain::{AuthSession, AuthTimeouts, CanonicalUser, Identity, JsonMap};

pub use identity::MockIdentityProvider;
pub use realtime::MockRealtimeFeed;
pub use stores::{MemoryCounselorStore, MemoryDocumentStore, MemoryFileStorage, MemoryProfileStore};

/// Timeouts small enough to exercise expiry paths quickly
pub fn fast_timeouts() -> AuthTimeouts {
    AuthTimeouts {
        session_check_ms: 100,
        enrichment_ms: 80,
        cache_verify_ms: 80,
        check_ceiling_ms: 300,
        refresh_threshold_secs: 300,
    }
}

pub fn map(value: Value) -> JsonMap {
    value.as_object().cloned().unwrap_or_default()
}

pub fn identity(id: &str, email: &str, metadata: Value) -> Identity {
    Identity {
        id: id.to_string(),
        email: Some(email.to_string()),
        metadata: map(metadata),
        ..Identity::default()
    }
}

pub fn session(token: &str, user: Identity) -> AuthSession {
    AuthSession { access_token: token.to_string(), refresh_token: None, expires_at: None, user }
}

/// Credentials as the resolver caches them
pub fn cached(token: &str, user: &CanonicalUser) -> StoredCredentials {
    let json = serde_json::to_string(user).unwrap_or_default();
    StoredCredentials::new(token, json, user.role.as_str())
}

/// Records every navigation
#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visits.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visits.lock().push(path.to_string());
    }
}

/// Every mock plus the services built on them
pub struct Harness {
    pub provider: Arc<MockIdentityProvider>,
    pub profiles: Arc<MemoryProfileStore>,
    pub counselors: Arc<MemoryCounselorStore>,
    pub documents: Arc<MemoryDocumentStore>,
    pub storage: Arc<MemoryFileStorage>,
    pub credentials: MemoryCredentialStore,
    pub navigator: Arc<RecordingNavigator>,
    pub reconciler: Arc<ProfileReconciler>,
    pub counselor: Arc<CounselorProfileSync>,
    pub resolver: Arc<SessionResolver>,
    pub context: Arc<AuthContext>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeouts(fast_timeouts())
    }

    pub fn with_timeouts(timeouts: AuthTimeouts) -> Self {
        let provider = Arc::new(MockIdentityProvider::new());
        let profiles = Arc::new(MemoryProfileStore::default());
        let counselors = Arc::new(MemoryCounselorStore::default());
        let documents = Arc::new(MemoryDocumentStore::default());
        let storage = Arc::new(MemoryFileStorage::default());
        let credentials = MemoryCredentialStore::new();
        let navigator = Arc::new(RecordingNavigator::default());

        let reconciler = Arc::new(ProfileReconciler::new(profiles.clone()));
        let counselor = Arc::new(CounselorProfileSync::new(
            counselors.clone(),
            documents.clone(),
            storage.clone(),
            "counselor-documents",
            Duration::from_secs(3600),
        ));
        let resolver = Arc::new(SessionResolver::new(
            provider.clone(),
            reconciler.clone(),
            counselor.clone(),
            Arc::new(credentials.clone()),
            timeouts,
        ));
        let context = Arc::new(AuthContext::new(
            resolver.clone(),
            provider.clone(),
            reconciler.clone(),
            counselor.clone(),
            navigator.clone(),
        ));

        Self {
            provider,
            profiles,
            counselors,
            documents,
            storage,
            credentials,
            navigator,
            reconciler,
            counselor,
            resolver,
            context,
        }
    }

    /// Seed an account the provider will accept, returning its identity
    pub fn account(&self, id: &str, email: &str, password: &str, metadata: Value) -> Identity {
        let identity = identity(id, email, metadata);
        self.provider.register(email, password, identity.clone());
        identity
    }

    /// Seed a completed patient profile row
    pub fn seed_complete_patient(&self, id: &str) {
        self.profiles.seed(json!({
            "id": id,
            "role": "patient",
            "full_name": "Pat Patient",
            "onboarding_completed": true,
            "onboarding_completed_at": "2024-01-01T00:00:00Z",
        }));
    }
}

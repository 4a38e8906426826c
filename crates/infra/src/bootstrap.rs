//! Wiring of adapters into the auth context

use std::sync::Arc;

use solace_common::{CredentialStore, KeychainCredentialStore};
use solace_core::counselor::FileStorage;
use solace_core::{AuthContext, CounselorProfileSync, Navigator, ProfileReconciler, SessionResolver};
use solace_domain::{Config, Result};
use tracing::info;

use crate::http::BackendClient;
use crate::identity::{GoTrueClient, SessionManager};
use crate::realtime::RealtimeHub;
use crate::rest::{RestCounselorProfileStore, RestDocumentStore, RestProfileStore};
use crate::storage::ObjectStorage;

/// Everything an application needs to drive auth
pub struct Services {
    pub context: Arc<AuthContext>,
    pub identity: Arc<GoTrueClient>,
    pub sessions: Arc<SessionManager>,
    pub storage: Arc<ObjectStorage>,
    /// Carries every committed profile and counselor-profile write
    pub realtime: RealtimeHub,
    avatars_bucket: String,
}

impl Services {
    /// Public url of an avatar stored under `path`
    #[must_use]
    pub fn avatar_url(&self, path: &str) -> String {
        self.storage.public_url(&self.avatars_bucket, path)
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("sessions", &self.sessions)
            .field("avatars_bucket", &self.avatars_bucket)
            .finish_non_exhaustive()
    }
}

/// Build services with credentials cached in the platform keychain
///
/// # Errors
/// Returns `SolaceError::Config` if the backend is not configured.
pub fn build(config: &Config, navigator: Arc<dyn Navigator>) -> Result<Services> {
    let credentials = Arc::new(KeychainCredentialStore::new(config.storage.keychain_service.clone()));
    build_with_credentials(config, navigator, credentials)
}

/// Build services over a caller-supplied credential store
///
/// # Errors
/// Returns `SolaceError::Config` if the backend is not configured.
pub fn build_with_credentials(
    config: &Config,
    navigator: Arc<dyn Navigator>,
    credentials: Arc<dyn CredentialStore>,
) -> Result<Services> {
    config.ensure_configured()?;
    let backend = BackendClient::new(&config.backend)?;
    let sessions = Arc::new(SessionManager::new(config.auth.refresh_threshold_secs));

    let realtime = RealtimeHub::new();

    let identity = Arc::new(GoTrueClient::new(backend.clone(), Arc::clone(&sessions)));
    let profiles = Arc::new(
        RestProfileStore::new(backend.clone(), Arc::clone(&sessions))
            .with_changes(realtime.clone()),
    );
    let counselor_profiles = Arc::new(
        RestCounselorProfileStore::new(backend.clone(), Arc::clone(&sessions))
            .with_changes(realtime.clone()),
    );
    let documents = Arc::new(RestDocumentStore::new(backend.clone(), Arc::clone(&sessions)));
    let storage = Arc::new(ObjectStorage::new(backend, Arc::clone(&sessions)));

    let reconciler = Arc::new(ProfileReconciler::new(profiles));
    let counselor = Arc::new(CounselorProfileSync::new(
        counselor_profiles,
        documents,
        storage.clone(),
        config.storage.documents_bucket.clone(),
        std::time::Duration::from_secs(config.storage.signed_url_ttl_secs),
    ));
    let resolver = Arc::new(SessionResolver::new(
        identity.clone(),
        Arc::clone(&reconciler),
        Arc::clone(&counselor),
        credentials,
        config.auth,
    ));
    let context =
        Arc::new(AuthContext::new(resolver, identity.clone(), reconciler, counselor, navigator));

    info!(backend = %config.backend.base_url(), "Auth services ready");
    Ok(Services {
        context,
        identity,
        sessions,
        storage,
        realtime,
        avatars_bucket: config.storage.avatars_bucket.clone(),
    })
}

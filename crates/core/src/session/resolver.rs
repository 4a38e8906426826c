//! Session resolution
//!
//! Decides who the current user is, in priority order:
//!
//! 1. The provider's own session, enriched from the profile store. A failed
//!    or slow enrichment falls back to the provisional user built from
//!    session metadata.
//! 2. The locally cached token and user, verified against the provider and
//!    re-read from the store under a shorter timeout. A verified token is
//!    handed back to the provider as its session before the re-read. Any
//!    failure discards the cache along with that session.
//! 3. Unauthenticated.
//!
//! Every network step is bounded. Unexpected failures clear the cache and
//! resolve to unauthenticated.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use solace_common::{CredentialStore, StoredCredentials};
use solace_domain::{
    AuthSession, AuthTimeouts, CanonicalUser, Identity, Result, Role, SolaceError,
};
use tracing::{debug, error, warn};

use crate::counselor::CounselorProfileSync;
use crate::identity::IdentityProvider;
use crate::profile::ProfileReconciler;

/// Which tier produced the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Provider,
    Cache,
}

/// An authenticated resolution
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub user: CanonicalUser,
    /// Identity as last reported by the provider
    pub identity: Identity,
    pub access_token: String,
    pub source: SessionSource,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Authenticated(Box<ResolvedSession>),
    Unauthenticated,
}

impl Resolution {
    #[must_use]
    pub fn user(&self) -> Option<&CanonicalUser> {
        match self {
            Self::Authenticated(session) => Some(&session.user),
            Self::Unauthenticated => None,
        }
    }
}

/// Bound `future` by `limit`, mapping expiry to a transient error
async fn bounded<T>(
    operation: &str,
    limit: Duration,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, future)
        .await
        .unwrap_or_else(|_| Err(SolaceError::timeout(operation, limit)))
}

pub struct SessionResolver {
    identity: Arc<dyn IdentityProvider>,
    reconciler: Arc<ProfileReconciler>,
    counselor: Arc<CounselorProfileSync>,
    credentials: Arc<dyn CredentialStore>,
    timeouts: AuthTimeouts,
}

impl SessionResolver {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        reconciler: Arc<ProfileReconciler>,
        counselor: Arc<CounselorProfileSync>,
        credentials: Arc<dyn CredentialStore>,
        timeouts: AuthTimeouts,
    ) -> Self {
        Self { identity, reconciler, counselor, credentials, timeouts }
    }

    #[must_use]
    pub const fn timeouts(&self) -> &AuthTimeouts {
        &self.timeouts
    }

    /// Resolve the current session; never fails
    pub async fn resolve(&self) -> Resolution {
        let started = Instant::now();
        let resolution = match self.try_resolve().await {
            Ok(resolution) => resolution,
            Err(err) => {
                error!(error = %err, kind = err.label(), "Session resolution failed; signing out locally");
                self.discard_cache();
                Resolution::Unauthenticated
            }
        };
        debug!(
            authenticated = resolution.user().is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Session resolved"
        );
        resolution
    }

    async fn try_resolve(&self) -> Result<Resolution> {
        if let Some(session) = self.provider_session().await {
            debug!(branch = "provider", user_id = %session.user.id, "Using provider session");
            let user = self.enrich_or_provisional(&session.user).await;
            self.remember(&user, &session.access_token);
            return Ok(Resolution::Authenticated(Box::new(ResolvedSession {
                user,
                identity: session.user,
                access_token: session.access_token,
                source: SessionSource::Provider,
            })));
        }

        // Read the cache at this point of every pass so a sign-out that
        // cleared it is always observed.
        if let Some(cached) = self.credentials.load()? {
            debug!(branch = "cache", "Verifying cached credentials");
            return self.verify_cached(cached).await;
        }

        debug!(branch = "unauthenticated", "No session or cached credentials");
        Ok(Resolution::Unauthenticated)
    }

    async fn provider_session(&self) -> Option<AuthSession> {
        let limit = self.timeouts.session_check();
        match bounded("session_check", limit, self.identity.get_session()).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "Provider session check failed; trying cached credentials");
                None
            }
        }
    }

    async fn enrich_or_provisional(&self, identity: &Identity) -> CanonicalUser {
        match self.refresh(identity).await {
            Ok(user) => user,
            Err(err) => {
                warn!(user_id = %identity.id, error = %err, "Profile enrichment failed; using session metadata");
                CanonicalUser::provisional(identity)
            }
        }
    }

    async fn verify_cached(&self, cached: StoredCredentials) -> Result<Resolution> {
        let cached_user: CanonicalUser = serde_json::from_str(&cached.user)?;

        let restored = AtomicBool::new(false);
        let verify = async {
            let identity = self.identity.get_user(&cached.token).await?;
            if identity.id != cached_user.id {
                return Err(SolaceError::InvalidCredentials(
                    "cached token belongs to a different user".into(),
                ));
            }
            // Store reads run under the row owner's token
            self.identity.restore_session(&cached.token, &identity);
            restored.store(true, Ordering::Release);
            let user = self.hydrate(&identity).await?;
            Ok((identity, user))
        };

        match bounded("cache_verify", self.timeouts.cache_verify(), verify).await {
            Ok((identity, user)) => {
                self.remember(&user, &cached.token);
                Ok(Resolution::Authenticated(Box::new(ResolvedSession {
                    user,
                    identity,
                    access_token: cached.token,
                    source: SessionSource::Cache,
                })))
            }
            Err(err) => {
                warn!(user_id = %cached_user.id, error = %err, "Cached credentials rejected; discarding");
                if restored.load(Ordering::Acquire) {
                    self.identity.forget_session();
                }
                self.discard_cache();
                Ok(Resolution::Unauthenticated)
            }
        }
    }

    /// Full read of the canonical user for `identity`
    ///
    /// Counselor extension data is best-effort: a failure there is logged and
    /// the profile-level user is still returned.
    ///
    /// # Errors
    /// Propagates the profile store's read error.
    pub async fn hydrate(&self, identity: &Identity) -> Result<CanonicalUser> {
        let profile = self.reconciler.read(identity).await?;
        let mut user = CanonicalUser::provisional(identity).with_profile(profile);

        if user.role == Role::Counselor {
            match self.counselor.load(&identity.id).await {
                Ok((extension, documents)) => {
                    user.counselor_profile = extension;
                    user.documents = documents;
                }
                Err(err) => {
                    warn!(user_id = %identity.id, error = %err, "Counselor profile unavailable");
                }
            }
        }
        Ok(user)
    }

    /// `hydrate` bounded by the enrichment timeout
    ///
    /// # Errors
    /// Returns `SolaceError::TransientSource` on timeout, else the read error.
    pub async fn refresh(&self, identity: &Identity) -> Result<CanonicalUser> {
        bounded("profile_enrichment", self.timeouts.enrichment(), self.hydrate(identity)).await
    }

    /// Persist the resolved user for the cache tier; failures are logged
    pub fn remember(&self, user: &CanonicalUser, access_token: &str) {
        let saved = serde_json::to_string(user)
            .map_err(SolaceError::from)
            .and_then(|json| {
                let credentials = StoredCredentials::new(access_token, json, user.role.as_str());
                self.credentials.save(&credentials).map_err(SolaceError::from)
            });
        if let Err(err) = saved {
            warn!(user_id = %user.id, error = %err, "Failed to cache credentials");
        }
    }

    /// Clear cached credentials; failures are logged
    pub fn discard_cache(&self) {
        if let Err(err) = self.credentials.clear() {
            warn!(error = %err, "Failed to clear cached credentials");
        }
    }
}

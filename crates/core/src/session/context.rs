//! Long-lived auth session service
//!
//! One instance is built at startup and shared. It owns the current
//! [`AuthState`], runs session checks, drives the onboarding gate, and
//! exposes the sign-in/sign-out/profile operations the application calls.
//!
//! Concurrency rules:
//! - every check captures an epoch; sign-in, sign-out and `dispose` bump it,
//!   and a check that finishes under an older epoch is discarded
//! - a check is bounded by the ceiling timeout and never leaves the state
//!   loading, even when it is superseded
//! - sign-out clears the local cache before awaiting the provider

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use solace_domain::constants::{HOME_PATH, SIGN_IN_PATH};
use solace_domain::{
    CanonicalUser, CounselorProfileUpdate, Identity, JsonMap, ProfileUpdate, Result, Role,
    SignUpOutcome, SignUpRequest, SolaceError,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ports::Navigator;
use super::resolver::{Resolution, SessionResolver};
use super::state::{AuthEvent, AuthState};
use crate::counselor::CounselorProfileSync;
use crate::gate::{self, landing_path, onboarding_complete, GateAction};
use crate::identity::{AuthChange, IdentityProvider};
use crate::profile::ProfileReconciler;
use crate::realtime::{BridgeHandle, RealtimeBridge, RealtimeFeed, UserRefresher};

/// Provider identity and token behind the current user
#[derive(Debug, Clone)]
struct ActiveSession {
    identity: Identity,
    access_token: String,
}

/// Marks a check as running for as long as it is alive
struct CheckFlight<'a>(&'a AtomicUsize);

impl<'a> CheckFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for CheckFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct AuthContext {
    resolver: Arc<SessionResolver>,
    identity: Arc<dyn IdentityProvider>,
    reconciler: Arc<ProfileReconciler>,
    counselor: Arc<CounselorProfileSync>,
    navigator: Arc<dyn Navigator>,
    state: RwLock<AuthState>,
    session: Mutex<Option<ActiveSession>>,
    current_path: RwLock<String>,
    epoch: AtomicU64,
    checks_in_flight: AtomicUsize,
}

impl AuthContext {
    pub fn new(
        resolver: Arc<SessionResolver>,
        identity: Arc<dyn IdentityProvider>,
        reconciler: Arc<ProfileReconciler>,
        counselor: Arc<CounselorProfileSync>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            resolver,
            identity,
            reconciler,
            counselor,
            navigator,
            state: RwLock::new(AuthState::default()),
            session: Mutex::new(None),
            current_path: RwLock::new(HOME_PATH.to_string()),
            epoch: AtomicU64::new(0),
            checks_in_flight: AtomicUsize::new(0),
        }
    }

    // State accessors
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<CanonicalUser> {
        self.state.read().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    #[must_use]
    pub fn check_role(&self, role: Role) -> bool {
        self.state.read().user.as_ref().is_some_and(|user| user.role == role)
    }

    #[must_use]
    pub fn is_check_in_flight(&self) -> bool {
        self.checks_in_flight.load(Ordering::Acquire) > 0
    }

    fn apply(&self, event: AuthEvent) {
        let mut state = self.state.write();
        *state = std::mem::take(&mut *state).apply(event);
    }

    fn active_session(&self) -> Option<ActiveSession> {
        self.session.lock().clone()
    }

    fn establish(&self, identity: Identity, access_token: String, user: CanonicalUser) {
        self.resolver.remember(&user, &access_token);
        *self.session.lock() = Some(ActiveSession { identity, access_token });
        self.apply(AuthEvent::Authenticated(user));
    }

    fn invalidate_checks(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }

    fn current_path(&self) -> String {
        self.current_path.read().clone()
    }

    fn set_path(&self, path: &str) {
        path.clone_into(&mut self.current_path.write());
    }

    fn follow(&self, action: GateAction, from: &str) {
        if let Some(target) = action.target() {
            if target != from {
                info!(from, to = target, ?action, "Redirecting");
                self.set_path(target);
                self.navigator.navigate(target);
            }
        }
    }

    // Session checks
    // ---------------------------------------------------------------------

    /// Resolve the session and gate `path`
    ///
    /// Bounded by the check ceiling; on expiry the loading flag is cleared
    /// and the last written state is kept.
    pub async fn check_auth(&self, path: &str) -> GateAction {
        self.set_path(path);
        let epoch = self.epoch.load(Ordering::Acquire);
        let action = {
            let _flight = CheckFlight::enter(&self.checks_in_flight);
            self.apply(AuthEvent::CheckStarted);

            let ceiling = self.resolver.timeouts().check_ceiling();
            if let Ok(action) = tokio::time::timeout(ceiling, self.run_check(epoch)).await {
                action
            } else {
                warn!(path, ceiling_ms = ceiling.as_millis() as u64, "Session check hit the ceiling");
                self.apply(AuthEvent::CheckTimedOut);
                GateAction::Allow
            }
        };
        self.settle_if_idle();
        action
    }

    /// Clear a loading flag that no running check will settle
    ///
    /// A superseded check writes nothing; the last check to finish clears
    /// the flag it raised and keeps whatever user was last written.
    fn settle_if_idle(&self) {
        let mut state = self.state.write();
        if state.is_loading && !self.is_check_in_flight() {
            debug!("Settling loading state left by a superseded check");
            *state = std::mem::take(&mut *state).apply(AuthEvent::CheckSuperseded);
        }
    }

    async fn run_check(&self, epoch: u64) -> GateAction {
        let resolution = self.resolver.resolve().await;
        if !self.is_current(epoch) {
            debug!("Discarding session check superseded by a newer auth change");
            return GateAction::Allow;
        }

        let path = self.current_path();
        let action = gate::evaluate(resolution.user(), &path);
        self.follow(action, &path);

        match resolution {
            Resolution::Authenticated(session) => {
                let session = *session;
                debug!(user_id = %session.user.id, source = ?session.source, "Session established");
                *self.session.lock() =
                    Some(ActiveSession { identity: session.identity, access_token: session.access_token });
                self.apply(AuthEvent::Authenticated(session.user));
            }
            Resolution::Unauthenticated => {
                *self.session.lock() = None;
                self.apply(AuthEvent::Unauthenticated);
            }
        }
        action
    }

    /// Re-gate after a route change without touching the network
    ///
    /// Skipped while a check is running or before the first check has run;
    /// the running check gates the latest path when it finishes. Every
    /// finished check settles the loading flag, so it never defers for good.
    pub fn on_navigation(&self, path: &str) -> GateAction {
        self.set_path(path);
        let state = self.state();
        if self.is_check_in_flight() || state.is_loading {
            debug!(path, "Check in flight; deferring route gate");
            return GateAction::Allow;
        }
        let action = gate::evaluate(state.user.as_ref(), path);
        self.follow(action, path);
        action
    }

    /// Drop the results of any pending check
    pub fn dispose(&self) {
        self.invalidate_checks();
        debug!("Auth context disposed; pending checks invalidated");
    }

    // Account operations
    // ---------------------------------------------------------------------

    /// # Errors
    /// Returns `SolaceError::InvalidCredentials` when the provider rejects
    /// the credentials, `SolaceError::Config` when it is not configured.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<CanonicalUser> {
        let session = self.identity.sign_in_with_password(email, password).await?;
        self.invalidate_checks();

        if let Err(err) = self.reconciler.sync(&session.user, &ProfileUpdate::default()).await {
            warn!(user_id = %session.user.id, error = %err, "Profile sync after sign-in failed");
        }
        let user = self.enriched(&session.user).await;
        info!(user_id = %user.id, role = %user.role, "Signed in");

        let landing = landing_path(user.role, onboarding_complete(&user));
        self.establish(session.user, session.access_token, user.clone());
        self.set_path(landing);
        self.navigator.navigate(landing);
        Ok(user)
    }

    /// Create an account; the requested role is written as an explicit value
    ///
    /// # Errors
    /// Returns `SolaceError::InvalidCredentials` when the provider rejects
    /// the request.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome> {
        let outcome = self.identity.sign_up(&request).await?;
        let identity = &outcome.identity;

        let overrides = ProfileUpdate {
            email: Some(request.email.clone()),
            full_name: request.full_name.clone(),
            role: Some(request.role),
            ..ProfileUpdate::default()
        };
        if let Err(err) = self.reconciler.sync(identity, &overrides).await {
            warn!(user_id = %identity.id, error = %err, "Profile creation after sign-up failed");
        }

        match &outcome.session {
            Some(session) => {
                self.invalidate_checks();
                let mut user = self.enriched(&session.user).await;
                if user.role == Role::Guest {
                    user.role = request.role;
                }
                info!(user_id = %user.id, role = %user.role, "Signed up");
                let landing = landing_path(user.role, onboarding_complete(&user));
                self.establish(session.user.clone(), session.access_token.clone(), user);
                self.set_path(landing);
                self.navigator.navigate(landing);
            }
            None => info!(user_id = %identity.id, "Signed up; awaiting email confirmation"),
        }
        Ok(outcome)
    }

    /// Clear local state first, then tell the provider
    pub async fn sign_out(&self) {
        self.invalidate_checks();
        let session = self.session.lock().take();
        self.resolver.discard_cache();
        self.apply(AuthEvent::SignedOut);

        if let Some(session) = session {
            if let Err(err) = self.identity.sign_out(&session.access_token).await {
                warn!(error = %err, "Provider sign-out failed; local session already cleared");
            }
            info!(user_id = %session.identity.id, "Signed out");
        }
        self.redirect_to_sign_in();
    }

    /// # Errors
    /// Propagates the provider error.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.identity.reset_password_for_email(email).await
    }

    pub fn redirect_to_dashboard(&self) {
        let path = self.state.read().role().dashboard_path();
        self.set_path(path);
        self.navigator.navigate(path);
    }

    pub fn redirect_to_sign_in(&self) {
        self.set_path(SIGN_IN_PATH);
        self.navigator.navigate(SIGN_IN_PATH);
    }

    // Profile operations
    // ---------------------------------------------------------------------

    /// Reconcile caller-supplied profile and counselor fields, then re-read
    ///
    /// # Errors
    /// Returns `SolaceError::InvalidInput` when nobody is signed in, and
    /// surfaces reconciliation and read errors.
    pub async fn update_profile(
        &self,
        update: ProfileUpdate,
        counselor: Option<CounselorProfileUpdate>,
    ) -> Result<CanonicalUser> {
        let active = self.require_session()?;
        self.reconciler.sync(&active.identity, &update).await?;
        self.counselor.reconcile(&active.identity.id, counselor.as_ref()).await?;

        let user = self.resolver.refresh(&active.identity).await?;
        self.resolver.remember(&user, &active.access_token);
        self.apply(AuthEvent::UserRefreshed(user.clone()));
        Ok(user)
    }

    /// Save onboarding answers, stamp completion, and go to the dashboard
    ///
    /// Store writes are best-effort: on failure the completion is still
    /// applied in memory so the user is not held on the onboarding route.
    ///
    /// # Errors
    /// Returns `SolaceError::InvalidInput` when nobody is signed in.
    pub async fn complete_onboarding(
        &self,
        update: ProfileUpdate,
        counselor: Option<CounselorProfileUpdate>,
    ) -> Result<CanonicalUser> {
        let active = self.require_session()?;
        let now = Utc::now();
        let overrides = update.merged_with(ProfileUpdate::completing_onboarding(now));

        let merged = match self.reconciler.sync(&active.identity, &overrides).await {
            Ok(outcome) => Some(outcome.merged),
            Err(err) => {
                warn!(user_id = %active.identity.id, error = %err, "Onboarding profile write failed");
                None
            }
        };
        if let Err(err) = self.counselor.reconcile(&active.identity.id, counselor.as_ref()).await {
            warn!(user_id = %active.identity.id, error = %err, "Onboarding counselor write failed");
        }

        let mut flag = JsonMap::new();
        flag.insert("onboarding_completed".into(), Value::Bool(true));
        flag.insert("onboarding_completed_at".into(), Value::from(now.to_rfc3339()));
        let identity = match self.identity.update_user(&active.access_token, &flag).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "Provider metadata update failed");
                let mut identity = active.identity.clone();
                identity.metadata.extend(flag);
                identity
            }
        };

        let user = match self.resolver.refresh(&identity).await {
            Ok(user) => user,
            Err(err) => {
                warn!(user_id = %identity.id, error = %err, "Re-read after onboarding failed");
                let base = self.user().unwrap_or_else(|| CanonicalUser::provisional(&identity));
                match merged {
                    Some(profile) => base.with_profile(profile),
                    None => {
                        let mut user = base;
                        user.profile.onboarding_completed = Some(true);
                        user.profile.onboarding_completed_at = Some(now);
                        user
                    }
                }
            }
        };

        info!(user_id = %user.id, role = %user.role, "Onboarding completed");
        *self.session.lock() =
            Some(ActiveSession { identity, access_token: active.access_token.clone() });
        self.resolver.remember(&user, &active.access_token);
        self.apply(AuthEvent::UserRefreshed(user.clone()));
        self.redirect_to_dashboard();
        Ok(user)
    }

    fn require_session(&self) -> Result<ActiveSession> {
        self.active_session()
            .ok_or_else(|| SolaceError::InvalidInput("no signed-in user".into()))
    }

    async fn enriched(&self, identity: &Identity) -> CanonicalUser {
        match self.resolver.refresh(identity).await {
            Ok(user) => user,
            Err(err) => {
                warn!(user_id = %identity.id, error = %err, "Profile enrichment failed; using session metadata");
                CanonicalUser::provisional(identity)
            }
        }
    }

    // Background wiring
    // ---------------------------------------------------------------------

    /// Follow provider session changes until the provider goes away
    pub fn watch_provider(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.identity.auth_changes();
        let context: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let change = match changes.recv().await {
                    Ok(change) => change,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed provider auth changes");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(context) = context.upgrade() else { break };
                context.on_auth_change(change).await;
            }
        })
    }

    async fn on_auth_change(&self, change: AuthChange) {
        match change {
            AuthChange::SignedOut => {
                if self.is_authenticated() {
                    info!("Provider ended the session");
                    self.invalidate_checks();
                    self.session.lock().take();
                    self.resolver.discard_cache();
                    self.apply(AuthEvent::SignedOut);
                }
            }
            AuthChange::SignedIn { user_id } => {
                let known = self.state.read().user.as_ref().is_some_and(|user| user.id == user_id);
                if !known {
                    let path = self.current_path();
                    self.check_auth(&path).await;
                }
            }
            AuthChange::TokenRefreshed { user_id } => {
                if let Ok(Some(session)) = self.identity.get_session().await {
                    let mut guard = self.session.lock();
                    if let Some(active) = guard.as_mut().filter(|a| a.identity.id == user_id) {
                        active.access_token = session.access_token;
                        debug!(user_id = %user_id, "Access token rotated");
                    }
                }
            }
        }
    }

    /// Start the realtime bridge for the signed-in user
    ///
    /// Subscription failures are logged and yield `None`.
    pub async fn start_realtime(self: &Arc<Self>, feed: Arc<dyn RealtimeFeed>) -> Option<BridgeHandle> {
        let user_id = self.state.read().user.as_ref().map(|user| user.id.clone())?;
        let refresher: Arc<dyn UserRefresher> = Arc::clone(self) as Arc<dyn UserRefresher>;
        match RealtimeBridge::new(feed, refresher).start(&user_id).await {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "Realtime subscription failed");
                None
            }
        }
    }
}

#[async_trait]
impl UserRefresher for AuthContext {
    fn current_user_id(&self) -> Option<String> {
        self.state.read().user.as_ref().map(|user| user.id.clone())
    }

    async fn refresh_user(&self) -> Result<()> {
        let Some(active) = self.active_session() else { return Ok(()) };
        let epoch = self.epoch.load(Ordering::Acquire);

        let user = self.resolver.refresh(&active.identity).await?;
        if !self.is_current(epoch) {
            debug!(user_id = %user.id, "Discarding refresh superseded by an auth change");
            return Ok(());
        }
        self.resolver.remember(&user, &active.access_token);
        self.apply(AuthEvent::UserRefreshed(user));
        Ok(())
    }
}

//! In-memory identity provider

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use solace_core::identity::{AuthChange, IdentityProvider};
use solace_domain::{
    AuthSession, Identity, JsonMap, Result, SignUpOutcome, SignUpRequest, SolaceError,
};
use tokio::sync::broadcast;

/// Provider with registered accounts and a single held session
///
/// `hang_session` makes `get_session` never complete; `fail_session` makes
/// it return a transient error.
pub struct MockIdentityProvider {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    tokens: Mutex<HashMap<String, Identity>>,
    session: Mutex<Option<AuthSession>>,
    hang_session: AtomicBool,
    fail_session: AtomicBool,
    confirm_email: AtomicBool,
    sign_out_calls: AtomicUsize,
    issued: AtomicUsize,
    restored: AtomicUsize,
    changes: broadcast::Sender<AuthChange>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            hang_session: AtomicBool::new(false),
            fail_session: AtomicBool::new(false),
            confirm_email: AtomicBool::new(false),
            sign_out_calls: AtomicUsize::new(0),
            issued: AtomicUsize::new(0),
            restored: AtomicUsize::new(0),
            changes,
        }
    }

    pub fn register(&self, email: &str, password: &str, identity: Identity) {
        self.accounts.lock().insert(email.to_string(), (password.to_string(), identity));
    }

    /// Hold `session` as the current provider session
    pub fn hold_session(&self, session: AuthSession) {
        self.tokens.lock().insert(session.access_token.clone(), session.user.clone());
        *self.session.lock() = Some(session);
    }

    /// Accept `token` for `get_user` without holding a session
    pub fn accept_token(&self, token: &str, identity: Identity) {
        self.tokens.lock().insert(token.to_string(), identity);
    }

    pub fn drop_session(&self) {
        *self.session.lock() = None;
    }

    pub fn hang_session(&self, hang: bool) {
        self.hang_session.store(hang, Ordering::SeqCst);
    }

    pub fn fail_session(&self, fail: bool) {
        self.fail_session.store(fail, Ordering::SeqCst);
    }

    /// Sign-ups return no session until the email is confirmed
    pub fn require_email_confirmation(&self, required: bool) {
        self.confirm_email.store(required, Ordering::SeqCst);
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// How many cached sessions were adopted
    pub fn restored_sessions(&self) -> usize {
        self.restored.load(Ordering::SeqCst)
    }

    pub fn emit(&self, change: AuthChange) {
        let _ = self.changes.send(change);
    }

    /// Metadata currently held for `id`
    pub fn metadata_of(&self, id: &str) -> Option<JsonMap> {
        self.tokens.lock().values().find(|identity| identity.id == id).map(|i| i.metadata.clone())
    }

    fn issue(&self, user: Identity) -> AuthSession {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        let session = super::session(&format!("token-{}-{n}", user.id), user);
        self.hold_session(session.clone());
        session
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn get_session(&self) -> Result<Option<AuthSession>> {
        if self.hang_session.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_session.load(Ordering::SeqCst) {
            return Err(SolaceError::TransientSource("identity provider unreachable".into()));
        }
        Ok(self.session.lock().clone())
    }

    async fn get_user(&self, access_token: &str) -> Result<Identity> {
        self.tokens
            .lock()
            .get(access_token)
            .cloned()
            .ok_or_else(|| SolaceError::InvalidCredentials("token not recognised".into()))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let account = self.accounts.lock().get(email).cloned();
        match account {
            Some((expected, identity)) if expected == password => Ok(self.issue(identity)),
            _ => Err(SolaceError::InvalidCredentials("Invalid login credentials".into())),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome> {
        if self.accounts.lock().contains_key(&request.email) {
            return Err(SolaceError::InvalidCredentials("User already registered".into()));
        }
        let n = self.accounts.lock().len();
        let identity = Identity {
            id: format!("user-{n}"),
            email: Some(request.email.clone()),
            metadata: request.provider_metadata(),
            ..Identity::default()
        };
        self.register(&request.email, &request.password, identity.clone());

        let session = if self.confirm_email.load(Ordering::SeqCst) {
            None
        } else {
            Some(self.issue(identity.clone()))
        };
        Ok(SignUpOutcome { identity, session })
    }

    async fn sign_out(&self, _access_token: &str) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        *self.session.lock() = None;
        Ok(())
    }

    async fn update_user(&self, access_token: &str, metadata: &JsonMap) -> Result<Identity> {
        let mut tokens = self.tokens.lock();
        let identity = tokens
            .get_mut(access_token)
            .ok_or_else(|| SolaceError::InvalidCredentials("token not recognised".into()))?;
        identity.metadata.extend(metadata.clone());
        let updated = identity.clone();
        if let Some(session) = self.session.lock().as_mut() {
            if session.user.id == updated.id {
                session.user = updated.clone();
            }
        }
        Ok(updated)
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        if self.accounts.lock().contains_key(email) {
            Ok(())
        } else {
            Err(SolaceError::NotFound(format!("no account for {email}")))
        }
    }

    fn restore_session(&self, access_token: &str, identity: &Identity) {
        self.restored.fetch_add(1, Ordering::SeqCst);
        self.hold_session(super::session(access_token, identity.clone()));
    }

    fn forget_session(&self) {
        self.drop_session();
    }

    fn auth_changes(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

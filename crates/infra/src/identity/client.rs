//! Identity provider over the hosted auth REST API

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use solace_core::identity::{AuthChange, IdentityProvider};
use solace_domain::{
    AuthSession, Identity, JsonMap, Result, SignUpOutcome, SignUpRequest, SolaceError,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::session::SessionManager;
use crate::errors::{error_message, status_error};
use crate::http::{ensure_success, read_json, BackendClient};

const TOKEN_PATH: &str = "auth/v1/token";
const SIGNUP_PATH: &str = "auth/v1/signup";
const USER_PATH: &str = "auth/v1/user";
const LOGOUT_PATH: &str = "auth/v1/logout";
const RECOVER_PATH: &str = "auth/v1/recover";

/// Token grant response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up returns a session when confirmation is off, else the bare user
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(Identity),
}

/// Credential rejections arrive as 400/401/422 on the auth endpoints
fn auth_error(status: StatusCode, body: &str) -> SolaceError {
    match status.as_u16() {
        400 | 401 | 403 | 422 => SolaceError::InvalidCredentials(error_message(body)),
        _ => status_error(status, body),
    }
}

pub struct GoTrueClient {
    backend: BackendClient,
    sessions: Arc<SessionManager>,
    refresh_lock: Mutex<()>,
}

impl GoTrueClient {
    pub fn new(backend: BackendClient, sessions: Arc<SessionManager>) -> Self {
        Self { backend, sessions, refresh_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    async fn grant(&self, grant_type: &str, body: &Value) -> Result<AuthSession> {
        let request = self
            .backend
            .request(Method::POST, &format!("{TOKEN_PATH}?grant_type={grant_type}"), None)?
            .json(body);
        let response = self.backend.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status, &body));
        }
        let token: TokenResponse = read_json(response).await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Exchange the refresh token; any failure drops the session
    async fn refresh(&self) -> Option<AuthSession> {
        let _guard = self.refresh_lock.lock().await;
        let refresh_token = match self.sessions.refresh_due() {
            None => return self.sessions.current(),
            Some(token) => token,
        };

        let Some(refresh_token) = refresh_token else {
            warn!("Session expiring without a refresh token; dropping it");
            self.sessions.clear();
            return None;
        };

        match self.grant("refresh_token", &json!({ "refresh_token": refresh_token })).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "Access token refreshed");
                self.sessions.store(session.clone(), true);
                Some(session)
            }
            Err(err) => {
                warn!(error = %err, kind = err.label(), "Token refresh failed; dropping session");
                self.sessions.clear();
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn get_session(&self) -> Result<Option<AuthSession>> {
        match self.sessions.refresh_due() {
            None => Ok(self.sessions.current()),
            Some(_) => Ok(self.refresh().await),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<Identity> {
        let request = self.backend.request(Method::GET, USER_PATH, Some(access_token))?;
        read_json(self.backend.send(request).await?).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session =
            self.grant("password", &json!({ "email": email, "password": password })).await?;
        info!(user_id = %session.user.id, "Signed in with password");
        self.sessions.store(session.clone(), false);
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome> {
        let body = json!({
            "email": request.email,
            "password": request.password,
            "data": request.provider_metadata(),
        });
        let http = self.backend.request(Method::POST, SIGNUP_PATH, None)?.json(&body);
        let response = self.backend.send(http).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status, &body));
        }

        match read_json::<SignUpResponse>(response).await? {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                info!(user_id = %session.user.id, role = %request.role, "Signed up");
                self.sessions.store(session.clone(), false);
                Ok(SignUpOutcome { identity: session.user.clone(), session: Some(session) })
            }
            SignUpResponse::User(identity) => {
                info!(user_id = %identity.id, "Signed up; confirmation pending");
                Ok(SignUpOutcome { identity, session: None })
            }
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.sessions.clear();
        let request = self.backend.request(Method::POST, LOGOUT_PATH, Some(access_token))?;
        let response = self.backend.send(request).await?;
        match response.status() {
            // An already-invalid token is as signed out as it gets
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                debug!("Provider session was already gone");
                Ok(())
            }
            _ => ensure_success(response).await.map(|_| ()),
        }
    }

    async fn update_user(&self, access_token: &str, metadata: &JsonMap) -> Result<Identity> {
        let request = self
            .backend
            .request(Method::PUT, USER_PATH, Some(access_token))?
            .json(&json!({ "data": metadata }));
        let identity: Identity = read_json(self.backend.send(request).await?).await?;
        self.sessions.update_user(identity.clone());
        Ok(identity)
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        let request =
            self.backend.request(Method::POST, RECOVER_PATH, None)?.json(&json!({ "email": email }));
        ensure_success(self.backend.send(request).await?).await?;
        info!("Password reset requested");
        Ok(())
    }

    fn restore_session(&self, access_token: &str, identity: &Identity) {
        self.sessions.restore(AuthSession {
            access_token: access_token.to_string(),
            refresh_token: None,
            expires_at: None,
            user: identity.clone(),
        });
    }

    fn forget_session(&self) {
        if self.sessions.discard() {
            debug!("Held session dropped locally");
        }
    }

    fn auth_changes(&self) -> broadcast::Receiver<AuthChange> {
        self.sessions.subscribe()
    }
}

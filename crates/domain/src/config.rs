//! Application configuration
//!
//! Plain data, loaded by `solace_infra::config`. Every section has a usable
//! default except the backend url and anon key, which must be supplied.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AVATARS_BUCKET, DEFAULT_CACHE_VERIFY_MS, DEFAULT_CHECK_CEILING_MS,
    DEFAULT_DOCUMENTS_BUCKET, DEFAULT_ENRICHMENT_MS, DEFAULT_KEYCHAIN_SERVICE,
    DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SESSION_CHECK_MS,
    DEFAULT_SIGNED_URL_TTL_SECS,
};
use crate::errors::{Result, SolaceError};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub auth: AuthTimeouts,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Fail fast when the backend cannot be reached at all
    ///
    /// # Errors
    /// Returns `SolaceError::Config` naming the first missing setting.
    pub fn ensure_configured(&self) -> Result<()> {
        self.backend.ensure_configured()
    }
}

/// Identity provider / relational store endpoint
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub request_timeout_ms: Option<u64>,
}

impl BackendConfig {
    /// # Errors
    /// Returns `SolaceError::Config` if the url or anon key is blank.
    pub fn ensure_configured(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(SolaceError::Config("backend.url is not set".into()));
        }
        if self.anon_key.trim().is_empty() {
            return Err(SolaceError::Config("backend.anon_key is not set".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS))
    }

    /// Base url without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &if self.anon_key.is_empty() { "" } else { "[REDACTED]" })
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Timeouts bounding each tier of a session check
///
/// Enrichment and cache verification are shorter than the session check,
/// which is shorter than the overall ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthTimeouts {
    pub session_check_ms: u64,
    pub enrichment_ms: u64,
    pub cache_verify_ms: u64,
    pub check_ceiling_ms: u64,
    pub refresh_threshold_secs: i64,
}

impl Default for AuthTimeouts {
    fn default() -> Self {
        Self {
            session_check_ms: DEFAULT_SESSION_CHECK_MS,
            enrichment_ms: DEFAULT_ENRICHMENT_MS,
            cache_verify_ms: DEFAULT_CACHE_VERIFY_MS,
            check_ceiling_ms: DEFAULT_CHECK_CEILING_MS,
            refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS,
        }
    }
}

impl AuthTimeouts {
    #[must_use]
    pub const fn session_check(&self) -> Duration {
        Duration::from_millis(self.session_check_ms)
    }

    #[must_use]
    pub const fn enrichment(&self) -> Duration {
        Duration::from_millis(self.enrichment_ms)
    }

    #[must_use]
    pub const fn cache_verify(&self) -> Duration {
        Duration::from_millis(self.cache_verify_ms)
    }

    #[must_use]
    pub const fn check_ceiling(&self) -> Duration {
        Duration::from_millis(self.check_ceiling_ms)
    }
}

/// Object storage and local credential settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub documents_bucket: String,
    pub avatars_bucket: String,
    pub keychain_service: String,
    pub signed_url_ttl_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            documents_bucket: DEFAULT_DOCUMENTS_BUCKET.to_string(),
            avatars_bucket: DEFAULT_AVATARS_BUCKET.to_string(),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

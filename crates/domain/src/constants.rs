//! Application constants
//!
//! Centralized location for routes, table names and timeout defaults used
//! throughout the application.

// Routes
pub const HOME_PATH: &str = "/";
pub const AUTH_PREFIX: &str = "/auth";
pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const SIGN_UP_PATH: &str = "/auth/signup";
pub const AUTH_CALLBACK_PATH: &str = "/auth/callback";
pub const DASHBOARD_PREFIX: &str = "/dashboard";
pub const ONBOARDING_PREFIX: &str = "/onboarding";

// Relational store tables
pub const PROFILES_TABLE: &str = "profiles";
pub const COUNSELOR_PROFILES_TABLE: &str = "counselor_profiles";
pub const COUNSELOR_DOCUMENTS_TABLE: &str = "counselor_documents";

// Session check timeouts (milliseconds)
pub const DEFAULT_SESSION_CHECK_MS: u64 = 5_000;
pub const DEFAULT_ENRICHMENT_MS: u64 = 3_000;
pub const DEFAULT_CACHE_VERIFY_MS: u64 = 2_500;
pub const DEFAULT_CHECK_CEILING_MS: u64 = 8_000;
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 300;

// Backend defaults
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DOCUMENTS_BUCKET: &str = "counselor-documents";
pub const DEFAULT_AVATARS_BUCKET: &str = "avatars";
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "Solace.auth";
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3_600;

// Realtime
pub const REALTIME_CHANNEL_CAPACITY: usize = 64;

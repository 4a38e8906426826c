//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Read a `.env` file into the environment, if one exists
//! 2. Load from `SOLACE_*` environment variables
//! 3. If the backend url or key is missing there, fall back to a file
//! 4. Files are probed in the working directory, its parents and next to
//!    the executable; JSON and TOML are supported
//!
//! ## Environment Variables
//! Required:
//! - `SOLACE_BACKEND_URL`: backend root url
//! - `SOLACE_BACKEND_ANON_KEY`: public project key
//!
//! Optional (defaults from `solace_domain::constants`):
//! - `SOLACE_REQUEST_TIMEOUT_MS`
//! - `SOLACE_SESSION_CHECK_MS`, `SOLACE_ENRICHMENT_MS`,
//!   `SOLACE_CACHE_VERIFY_MS`, `SOLACE_CHECK_CEILING_MS`,
//!   `SOLACE_REFRESH_THRESHOLD_SECS`
//! - `SOLACE_DOCUMENTS_BUCKET`, `SOLACE_AVATARS_BUCKET`,
//!   `SOLACE_KEYCHAIN_SERVICE`, `SOLACE_SIGNED_URL_TTL_SECS`
//! - `SOLACE_LOG_LEVEL`, `SOLACE_LOG_JSON`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use solace_domain::{
    AuthTimeouts, BackendConfig, Config, LoggingConfig, Result, SolaceError, StorageConfig,
};

const FILE_NAMES: [&str; 4] = ["config.toml", "config.json", "solace.toml", "solace.json"];

/// Load configuration with automatic fallback
///
/// # Errors
/// Returns `SolaceError::Config` if neither the environment nor any config
/// file yields a configuration, or a file cannot be parsed.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Environment incomplete, trying config file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `SOLACE_*` environment variables
///
/// # Errors
/// Returns `SolaceError::Config` if a required variable is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let auth_defaults = AuthTimeouts::default();
    let storage_defaults = StorageConfig::default();
    let logging_defaults = LoggingConfig::default();

    let backend = BackendConfig {
        url: env_var("SOLACE_BACKEND_URL")?,
        anon_key: env_var("SOLACE_BACKEND_ANON_KEY")?,
        request_timeout_ms: env_opt("SOLACE_REQUEST_TIMEOUT_MS")?,
    };

    let auth = AuthTimeouts {
        session_check_ms: env_or("SOLACE_SESSION_CHECK_MS", auth_defaults.session_check_ms)?,
        enrichment_ms: env_or("SOLACE_ENRICHMENT_MS", auth_defaults.enrichment_ms)?,
        cache_verify_ms: env_or("SOLACE_CACHE_VERIFY_MS", auth_defaults.cache_verify_ms)?,
        check_ceiling_ms: env_or("SOLACE_CHECK_CEILING_MS", auth_defaults.check_ceiling_ms)?,
        refresh_threshold_secs: env_or(
            "SOLACE_REFRESH_THRESHOLD_SECS",
            auth_defaults.refresh_threshold_secs,
        )?,
    };

    let storage = StorageConfig {
        documents_bucket: env_or("SOLACE_DOCUMENTS_BUCKET", storage_defaults.documents_bucket)?,
        avatars_bucket: env_or("SOLACE_AVATARS_BUCKET", storage_defaults.avatars_bucket)?,
        keychain_service: env_or("SOLACE_KEYCHAIN_SERVICE", storage_defaults.keychain_service)?,
        signed_url_ttl_secs: env_or(
            "SOLACE_SIGNED_URL_TTL_SECS",
            storage_defaults.signed_url_ttl_secs,
        )?,
    };

    let logging = LoggingConfig {
        level: env_or("SOLACE_LOG_LEVEL", logging_defaults.level)?,
        json: env_bool("SOLACE_LOG_JSON", logging_defaults.json),
    };

    Ok(Config { backend, auth, storage, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `SolaceError::Config` if the file is missing or malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SolaceError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SolaceError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SolaceError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Format is chosen by extension
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SolaceError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SolaceError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SolaceError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations
///
/// Looks in the working directory and two parents, then beside the
/// executable and two of its parents.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| root.ancestors().take(3))
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SolaceError::Config(format!("Missing required environment variable: {key}")))
}

fn env_opt<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SolaceError::Config(format!("Invalid {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    Ok(env_opt(key)?.unwrap_or(default))
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 14] = [
        "SOLACE_BACKEND_URL",
        "SOLACE_BACKEND_ANON_KEY",
        "SOLACE_REQUEST_TIMEOUT_MS",
        "SOLACE_SESSION_CHECK_MS",
        "SOLACE_ENRICHMENT_MS",
        "SOLACE_CACHE_VERIFY_MS",
        "SOLACE_CHECK_CEILING_MS",
        "SOLACE_REFRESH_THRESHOLD_SECS",
        "SOLACE_DOCUMENTS_BUCKET",
        "SOLACE_AVATARS_BUCKET",
        "SOLACE_KEYCHAIN_SERVICE",
        "SOLACE_SIGNED_URL_TTL_SECS",
        "SOLACE_LOG_LEVEL",
        "SOLACE_LOG_JSON",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for value in ["1", "true", "yes", "on", "TRUE"] {
            std::env::set_var("SOLACE_TEST_BOOL", value);
            assert!(env_bool("SOLACE_TEST_BOOL", false), "{value} should be true");
        }
        for value in ["0", "false", "no", "off"] {
            std::env::set_var("SOLACE_TEST_BOOL", value);
            assert!(!env_bool("SOLACE_TEST_BOOL", true), "{value} should be false");
        }

        std::env::remove_var("SOLACE_TEST_BOOL");
        assert!(env_bool("SOLACE_TEST_BOOL", true));
        assert!(!env_bool("SOLACE_TEST_BOOL", false));
    }

    #[test]
    fn required_vars_with_defaults_for_the_rest() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("SOLACE_BACKEND_URL", "https://project.example.co");
        std::env::set_var("SOLACE_BACKEND_ANON_KEY", "anon");

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.backend.url, "https://project.example.co");
        assert_eq!(config.backend.request_timeout_ms, None);
        assert_eq!(config.auth, AuthTimeouts::default());
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn optional_vars_override_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("SOLACE_BACKEND_URL", "https://project.example.co");
        std::env::set_var("SOLACE_BACKEND_ANON_KEY", "anon");
        std::env::set_var("SOLACE_REQUEST_TIMEOUT_MS", "2500");
        std::env::set_var("SOLACE_CHECK_CEILING_MS", "12000");
        std::env::set_var("SOLACE_DOCUMENTS_BUCKET", "docs");
        std::env::set_var("SOLACE_LOG_LEVEL", "solace_core=debug");
        std::env::set_var("SOLACE_LOG_JSON", "yes");

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.backend.request_timeout_ms, Some(2_500));
        assert_eq!(config.auth.check_ceiling_ms, 12_000);
        assert_eq!(config.auth.session_check_ms, AuthTimeouts::default().session_check_ms);
        assert_eq!(config.storage.documents_bucket, "docs");
        assert_eq!(config.logging.level, "solace_core=debug");
        assert!(config.logging.json);
    }

    #[test]
    fn missing_backend_key_is_a_config_error() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("SOLACE_BACKEND_URL", "https://project.example.co");
        std::env::set_var("SOLACE_BACKEND_ANON_KEY", "   ");

        let err = load_from_env().unwrap_err();
        clear_env();

        assert!(matches!(err, SolaceError::Config(ref msg) if msg.contains("SOLACE_BACKEND_ANON_KEY")));
    }

    #[test]
    fn invalid_number_is_a_config_error() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("SOLACE_BACKEND_URL", "https://project.example.co");
        std::env::set_var("SOLACE_BACKEND_ANON_KEY", "anon");
        std::env::set_var("SOLACE_ENRICHMENT_MS", "soon");

        let err = load_from_env().unwrap_err();
        clear_env();

        assert!(matches!(err, SolaceError::Config(ref msg) if msg.contains("SOLACE_ENRICHMENT_MS")));
    }

    #[test]
    fn loads_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "backend": {{ "url": "https://project.example.co", "anon_key": "anon" }},
                "auth": {{ "session_check_ms": 4000 }}
            }}"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.backend.anon_key, "anon");
        assert_eq!(config.auth.session_check_ms, 4_000);
        assert_eq!(config.auth.enrichment_ms, AuthTimeouts::default().enrichment_ms);
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [backend]
            url = "https://project.example.co"
            anon_key = "anon"

            [storage]
            documents_bucket = "docs"

            [logging]
            json = true
            "#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.storage.documents_bucket, "docs");
        assert_eq!(config.storage.avatars_bucket, StorageConfig::default().avatars_bucket);
        assert!(config.logging.json);
    }

    #[test]
    fn malformed_or_unknown_files_are_rejected() {
        let mut bad_json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(bad_json, "{{ not json").unwrap();
        assert!(matches!(
            load_from_file(Some(bad_json.path().to_path_buf())),
            Err(SolaceError::Config(ref msg)) if msg.contains("JSON")
        ));

        let yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            load_from_file(Some(yaml.path().to_path_buf())),
            Err(SolaceError::Config(ref msg)) if msg.contains("Unsupported")
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let missing = PathBuf::from("/nonexistent/solace/config.toml");
        assert!(matches!(load_from_file(Some(missing)), Err(SolaceError::Config(_))));
    }

    #[test]
    fn parse_defaults_to_json_without_extension() {
        let file = NamedTempFile::new().unwrap();
        let config = parse_config(r#"{ "backend": { "url": "u", "anon_key": "k" } }"#, file.path());
        assert_eq!(config.unwrap().backend.url, "u");
    }
}

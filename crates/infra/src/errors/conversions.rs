//! Conversions from external infrastructure errors into domain errors.

use reqwest::{Error as HttpError, StatusCode};
use serde_json::Value;
use solace_domain::SolaceError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SolaceError);

impl From<InfraError> for SolaceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SolaceError> for InfraError {
    fn from(value: SolaceError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSolaceError {
    fn into_solace(self) -> SolaceError;
}

/* -------------------------------------------------------------------------- */
/* HTTP status → SolaceError */
/* -------------------------------------------------------------------------- */

/// Pull a human-readable message out of an error body
///
/// Identity and REST endpoints use different keys; the raw body is the
/// fallback.
#[must_use]
pub fn error_message(body: &str) -> String {
    const KEYS: [&str; 5] = ["error_description", "msg", "message", "error", "details"];

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(message) =
            KEYS.iter().find_map(|key| map.get(*key).and_then(Value::as_str)).filter(|m| !m.is_empty())
        {
            return message.to_string();
        }
    }
    body.trim().chars().take(200).collect()
}

/// Map an unsuccessful response to the domain taxonomy
#[must_use]
pub fn status_error(status: StatusCode, body: &str) -> SolaceError {
    let message = format!(
        "HTTP {} {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status"),
        error_message(body)
    );

    match status.as_u16() {
        401 | 403 => SolaceError::InvalidCredentials(message),
        404 => SolaceError::NotFound(message),
        408 | 429 | 500..=599 => SolaceError::TransientSource(message),
        409 => SolaceError::Database(message),
        400..=499 => SolaceError::InvalidInput(message),
        _ => SolaceError::TransientSource(message),
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SolaceError */
/* -------------------------------------------------------------------------- */

impl IntoSolaceError for HttpError {
    fn into_solace(self) -> SolaceError {
        if self.is_timeout() {
            return SolaceError::TransientSource("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return SolaceError::TransientSource("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status, "");
        }

        if self.is_decode() {
            return SolaceError::Serialization(format!("HTTP response body: {self}"));
        }

        if self.is_builder() {
            return SolaceError::Internal(format!("HTTP request could not be built: {self}"));
        }

        SolaceError::TransientSource(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_solace())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → SolaceError */
/* -------------------------------------------------------------------------- */

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        Self(SolaceError::Config(format!("invalid backend url: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

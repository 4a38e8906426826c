//! Error types used throughout Solace

use std::time::Duration;

use serde::{Deserialize, Serialize};
use solace_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Main error type for Solace
///
/// The first five variants map the failure taxonomy callers act on:
/// transient source failures degrade to a fallback tier, reconciliation
/// writes are swallowed after logging, and the remaining three are surfaced.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SolaceError {
    /// Network failure or timeout talking to the identity provider or store
    #[error("Transient source error: {0}")]
    TransientSource(String),

    /// Profile or extension upsert failed
    #[error("Reconciliation write failed: {0}")]
    ReconciliationWrite(String),

    /// Sign-in or sign-up rejected by the identity provider
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Document upload failed (after compensating cleanup)
    #[error("Document upload failed: {0}")]
    DocumentUpload(String),

    /// Backend not configured
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Solace operations
pub type Result<T> = std::result::Result<T, SolaceError>;

impl SolaceError {
    /// A bounded operation did not finish in time
    pub fn timeout(operation: &str, duration: Duration) -> Self {
        Self::TransientSource(format!(
            "{operation} timed out after {}ms",
            duration.as_millis()
        ))
    }

    /// Wrap a failed store call with the table it targeted
    pub fn reconciliation(table: &str, source: &Self) -> Self {
        Self::ReconciliationWrite(format!("{table}: {source}"))
    }

    /// Short machine-friendly label, used as a structured log field
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TransientSource(_) => "transient_source",
            Self::ReconciliationWrite(_) => "reconciliation_write",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::DocumentUpload(_) => "document_upload",
            Self::Config(_) => "config",
            Self::Database(_) => "database",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

impl ErrorClassification for SolaceError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientSource(_) | Self::ReconciliationWrite(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TransientSource(_) | Self::ReconciliationWrite(_) => ErrorSeverity::Warning,
            Self::NotFound(_) => ErrorSeverity::Info,
            Self::InvalidCredentials(_) | Self::InvalidInput(_) => ErrorSeverity::Warning,
            Self::DocumentUpload(_)
            | Self::Config(_)
            | Self::Database(_)
            | Self::Serialization(_) => ErrorSeverity::Error,
            Self::Internal(_) => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl From<serde_json::Error> for SolaceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<CommonError> for SolaceError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Config { .. } => Self::Config(err.to_string()),
            CommonError::Serialization { .. } => Self::Serialization(err.to_string()),
            CommonError::Persistence { .. } => Self::Database(err.to_string()),
            CommonError::Timeout { .. } | CommonError::Backend { .. } => {
                Self::TransientSource(err.to_string())
            }
            CommonError::Validation { .. } => Self::InvalidInput(err.to_string()),
            CommonError::NotFound { .. } => Self::NotFound(err.to_string()),
            CommonError::Unauthorized { .. } => Self::InvalidCredentials(err.to_string()),
            CommonError::Internal { .. } => Self::Internal(err.to_string()),
        }
    }
}

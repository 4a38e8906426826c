//! # Solace Domain
//!
//! Pure data model for identity and profile reconciliation.
//!
//! This crate contains:
//! - Identity, profile, counselor-extension and document records
//! - The canonical user and the closed `Role` set with its route table
//! - Attribute coercions and legacy-spelling probes
//! - `SolaceError` and the `Result` alias
//! - Configuration structures and constants
//!
//! ## Architecture
//! - Depends only on `solace-common` (error classification)
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::{AuthTimeouts, BackendConfig, Config, LoggingConfig, StorageConfig};
pub use errors::{Result, SolaceError};
pub use types::*;

//! # Solace Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP plumbing and the backend client (apikey + bearer auth)
//! - The identity provider client and its in-memory session manager
//! - REST stores for `profiles`, `counselor_profiles` and `counselor_documents`
//! - Object storage and the in-process realtime hub
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `solace-core`
//! - Contains all "impure" code (network, keychain, files)

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod http;
pub mod identity;
pub mod observability;
pub mod realtime;
pub mod rest;
pub mod storage;

// Re-export commonly used items
pub use bootstrap::{build, build_with_credentials, Services};
pub use errors::InfraError;
pub use http::{BackendClient, HttpClient};
pub use identity::{GoTrueClient, SessionManager};
pub use observability::init_tracing;
pub use realtime::RealtimeHub;
pub use rest::{RestCounselorProfileStore, RestDocumentStore, RestProfileStore};
pub use storage::ObjectStorage;

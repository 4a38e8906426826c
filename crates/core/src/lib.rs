//! # Solace Core
//!
//! Auth and profile business logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the identity provider, stores, storage and realtime
//! - Profile reconciliation and counselor document handling
//! - The onboarding gate and the auth context service
//!
//! ## Architecture Principles
//! - Only depends on `solace-common` and `solace-domain`
//! - No HTTP, keychain or platform code
//! - All external dependencies via traits

pub mod counselor;
pub mod gate;
pub mod identity;
pub mod profile;
pub mod realtime;
pub mod session;

pub use counselor::{
    CompensationLog, CounselorProfileStore, CounselorProfileSync, DocumentStore, FileStorage,
};
pub use gate::{evaluate, landing_path, onboarding_complete, GateAction, PathClass};
pub use identity::{AuthChange, IdentityProvider};
pub use profile::{ProfileReconciler, ProfileStore, ReconcileOutcome, WriteMode};
pub use realtime::{BridgeHandle, RealtimeBridge, RealtimeFeed, UserRefresher};
pub use session::{
    AuthContext, AuthEvent, AuthState, Navigator, Resolution, SessionResolver, SessionSource,
};

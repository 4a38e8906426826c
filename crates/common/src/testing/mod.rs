//! Testing utilities and helpers
//!
//! - **[`mocks`]**: in-memory implementations of common traits
//!
//! ```rust
//! use solace_common::testing::MemoryCredentialStore;
//! use solace_common::{CredentialStore, StoredCredentials};
//!
//! let store = MemoryCredentialStore::new();
//! store.save(&StoredCredentials::new("token", "{}", "patient")).unwrap();
//! assert!(store.load().unwrap().is_some());
//! ```

pub mod mocks;

pub use mocks::MemoryCredentialStore;

//! Local credential persistence
//!
//! The session resolver keeps a small amount of state between runs so that a
//! user who was signed in can be re-validated when the identity provider's own
//! session is unavailable: the last access token, the serialized canonical
//! user, and the user's role. These live under three fixed keys and are always
//! written and cleared together.
//!
//! ```text
//! ┌──────────────────┐
//! │ CredentialStore  │  load / save / clear
//! └────────┬─────────┘
//!          ├──► KeychainCredentialStore  (platform keychain via `keyring`)
//!          └──► MemoryCredentialStore    (testing::mocks)
//! ```

mod keychain;
pub mod traits;
pub mod types;

pub use keychain::KeychainCredentialStore;
pub use traits::CredentialStore;
pub use types::{StoredCredentials, AUTH_TOKEN_KEY, AUTH_USER_KEY, CREDENTIAL_KEYS, USER_ROLE_KEY};

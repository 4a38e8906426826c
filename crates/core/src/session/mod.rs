//! Session resolution, auth state and the auth context service

pub mod context;
pub mod ports;
pub mod resolver;
pub mod state;

pub use context::AuthContext;
pub use ports::Navigator;
pub use resolver::{Resolution, ResolvedSession, SessionResolver, SessionSource};
pub use state::{AuthEvent, AuthState};

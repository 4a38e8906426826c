//! Identity provider boundary

pub mod ports;

pub use ports::{AuthChange, IdentityProvider};

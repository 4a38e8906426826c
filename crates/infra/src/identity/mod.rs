//! Identity provider adapter

pub mod client;
pub mod session;

pub use client::GoTrueClient;
pub use session::SessionManager;

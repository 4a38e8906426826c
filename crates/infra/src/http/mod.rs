//! HTTP plumbing shared by the backend adapters

pub mod backend;
pub mod client;

pub use backend::{ensure_success, read_json, BackendClient};
pub use client::{HttpClient, HttpClientBuilder};

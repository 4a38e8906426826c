//! Configuration loading
//!
//! Loads `solace_domain::Config` from environment variables or files.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

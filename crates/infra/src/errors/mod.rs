//! Infrastructure error conversions

pub mod conversions;

pub use conversions::{error_message, status_error, InfraError};

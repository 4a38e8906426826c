//! In-process change feed

pub mod hub;

pub use hub::RealtimeHub;

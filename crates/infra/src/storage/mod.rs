//! Object storage adapter

pub mod objects;

pub use objects::ObjectStorage;

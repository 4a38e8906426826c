//! Relational store adapters

pub mod documents;
pub mod profiles;
pub mod table;

pub use documents::RestDocumentStore;
pub use profiles::{RestCounselorProfileStore, RestProfileStore};
pub use table::RestTable;

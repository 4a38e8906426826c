//! Counselor extension and document handling

pub mod ports;
pub mod sync;

pub use ports::{CounselorProfileStore, DocumentStore, FileStorage};
pub use sync::{storage_path, Compensation, CompensationLog, CounselorProfileSync};

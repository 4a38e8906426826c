//! Domain types and models

pub mod counselor;
pub mod document;
pub mod identity;
pub mod profile;
pub mod role;
pub mod user;

/// Untyped JSON object, as stored in metadata and preference columns
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

pub use counselor::{CounselorExtensionRow, CounselorProfileUpdate};
pub use document::{
    current_document, DocumentRecord, DocumentReviewStatus, DocumentType, DocumentUpload,
    NewDocument,
};
pub use identity::{AuthSession, Identity, SignUpOutcome, SignUpRequest};
pub use profile::{ApprovalStatus, ProfileRow, ProfileUpdate, ProviderHints, VisibilitySettings};
pub use role::Role;
pub use user::CanonicalUser;

//! Counselor document attachments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_wire_conversions;
use crate::utils::coerce::lenient;

/// Attachment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Resume,
    License,
    Certification,
    Other,
}

impl_wire_conversions!(DocumentType {
    Resume => "resume",
    License => "license",
    Certification => "certification",
    Other => "other",
});

impl DocumentType {
    /// Types that keep a single current record per profile
    #[must_use]
    pub const fn is_single_current(self) -> bool {
        matches!(self, Self::Resume | Self::License)
    }
}

/// Review state of an uploaded document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl_wire_conversions!(DocumentReviewStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// One row of `counselor_documents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub profile_id: String,
    pub document_type: DocumentType,
    pub storage_path: String,
    pub file_name: String,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub review_status: Option<DocumentReviewStatus>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Metadata row to insert after the object is stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDocument {
    pub profile_id: String,
    pub document_type: DocumentType,
    pub storage_path: String,
    pub file_name: String,
    pub review_status: DocumentReviewStatus,
    pub uploaded_at: DateTime<Utc>,
}

/// File handed to `upload_documents`
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub document_type: DocumentType,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(
        document_type: DocumentType,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            document_type,
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("document_type", &self.document_type)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Most recent record of `document_type`: latest upload time, then highest id
#[must_use]
pub fn current_document(
    documents: &[DocumentRecord],
    document_type: DocumentType,
) -> Option<&DocumentRecord> {
    documents
        .iter()
        .filter(|doc| doc.document_type == document_type)
        .max_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then_with(|| a.id.cmp(&b.id)))
}

//! Counselor extension row and document synchronisation

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use solace_domain::constants::COUNSELOR_PROFILES_TABLE;
use solace_domain::{
    current_document, CounselorExtensionRow, CounselorProfileUpdate, DocumentRecord,
    DocumentReviewStatus, DocumentType, DocumentUpload, NewDocument, Result, SolaceError,
};
use tracing::{debug, info, warn};

use super::ports::{CounselorProfileStore, DocumentStore, FileStorage};

/// Undo step for a side effect that already happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    RemoveObject { bucket: String, path: String },
}

/// Compensations owed by an in-progress upload
///
/// Either `commit` (the upload completed) or `unwind` (it failed).
#[derive(Debug, Default)]
#[must_use]
pub struct CompensationLog {
    steps: Vec<Compensation>,
}

impl CompensationLog {
    pub fn record(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    pub fn commit(self) {}

    /// Run recorded steps in reverse; returns the steps that failed
    pub async fn unwind(self, storage: &dyn FileStorage) -> Vec<Compensation> {
        let mut failed = Vec::new();
        for step in self.steps.into_iter().rev() {
            match &step {
                Compensation::RemoveObject { bucket, path } => {
                    if let Err(err) = storage.remove(bucket, std::slice::from_ref(path)).await {
                        warn!(%bucket, %path, error = %err, "Failed to remove orphaned object");
                        failed.push(step);
                    }
                }
            }
        }
        failed
    }
}

/// Object key for an upload: `<profile>/<type>/<millis>-<file>`
#[must_use]
pub fn storage_path(
    profile_id: &str,
    document_type: DocumentType,
    file_name: &str,
    now: DateTime<Utc>,
) -> String {
    let safe: String = file_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    format!("{profile_id}/{document_type}/{}-{safe}", now.timestamp_millis())
}

/// Keeps the counselor extension row and document list in step with
/// caller-supplied updates
pub struct CounselorProfileSync {
    profiles: Arc<dyn CounselorProfileStore>,
    documents: Arc<dyn DocumentStore>,
    storage: Arc<dyn FileStorage>,
    bucket: String,
    signed_url_ttl: Duration,
}

impl CounselorProfileSync {
    pub fn new(
        profiles: Arc<dyn CounselorProfileStore>,
        documents: Arc<dyn DocumentStore>,
        storage: Arc<dyn FileStorage>,
        bucket: impl Into<String>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self { profiles, documents, storage, bucket: bucket.into(), signed_url_ttl }
    }

    /// Insert or update the extension row from the supplied fields only
    ///
    /// No-op for an empty update. Metadata is merged into the stored bag.
    ///
    /// # Errors
    /// Returns `SolaceError::ReconciliationWrite` if the lookup or write fails.
    pub async fn reconcile(
        &self,
        profile_id: &str,
        update: Option<&CounselorProfileUpdate>,
    ) -> Result<()> {
        let Some(update) = update else { return Ok(()) };
        let mut assignments = update.to_assignments();
        if assignments.is_empty() {
            debug!(profile_id, "Empty counselor update; nothing to write");
            return Ok(());
        }

        let wrap = |err: SolaceError| SolaceError::reconciliation(COUNSELOR_PROFILES_TABLE, &err);
        let existing = self.profiles.fetch(profile_id).await.map_err(wrap)?;
        let now = Value::from(Utc::now().to_rfc3339());
        assignments.insert("updated_at".into(), now.clone());

        match existing {
            Some(row) => {
                if let Some(Value::Object(supplied)) = assignments.remove("metadata") {
                    let mut metadata = row.metadata.unwrap_or_default();
                    metadata.extend(supplied);
                    assignments.insert("metadata".into(), Value::Object(metadata));
                }
                self.profiles.update(profile_id, &assignments).await.map_err(wrap)?;
                info!(profile_id, columns = assignments.len(), "Counselor profile updated");
            }
            None => {
                assignments.insert("profile_id".into(), Value::from(profile_id));
                assignments.insert("created_at".into(), now);
                self.profiles.insert(&assignments).await.map_err(wrap)?;
                info!(profile_id, columns = assignments.len(), "Counselor profile created");
            }
        }
        Ok(())
    }

    /// Store each file and record its metadata
    ///
    /// A resume or license replaces any prior record of that type; other
    /// types accumulate. If recording metadata fails the stored object is
    /// removed before the error is returned. Uploads that completed before a
    /// failure stay committed.
    ///
    /// # Errors
    /// Returns `SolaceError::InvalidInput` for an empty file and
    /// `SolaceError::DocumentUpload` for storage or metadata failures.
    pub async fn upload_documents(
        &self,
        profile_id: &str,
        uploads: Vec<DocumentUpload>,
    ) -> Result<Vec<DocumentRecord>> {
        let mut recorded = Vec::with_capacity(uploads.len());
        for upload in uploads {
            recorded.push(self.upload_one(profile_id, upload).await?);
        }
        Ok(recorded)
    }

    async fn upload_one(&self, profile_id: &str, upload: DocumentUpload) -> Result<DocumentRecord> {
        if upload.file_name.trim().is_empty() || upload.bytes.is_empty() {
            return Err(SolaceError::InvalidInput(format!(
                "{} upload has no file content",
                upload.document_type
            )));
        }

        let document_type = upload.document_type;
        if document_type.is_single_current() {
            let replaced = self
                .documents
                .delete_by_type(profile_id, document_type)
                .await
                .map_err(|e| {
                    SolaceError::DocumentUpload(format!("replacing prior {document_type}: {e}"))
                })?;
            if !replaced.is_empty() {
                debug!(profile_id, %document_type, replaced = replaced.len(), "Removed prior document records");
            }
        }

        let now = Utc::now();
        let path = storage_path(profile_id, document_type, &upload.file_name, now);
        let mut log = CompensationLog::default();

        let stored_path = self
            .storage
            .upload(&self.bucket, &path, upload.bytes, &upload.content_type)
            .await
            .map_err(|e| SolaceError::DocumentUpload(format!("{}: {e}", upload.file_name)))?;
        log.record(Compensation::RemoveObject {
            bucket: self.bucket.clone(),
            path: stored_path.clone(),
        });

        let document = NewDocument {
            profile_id: profile_id.to_string(),
            document_type,
            storage_path: stored_path,
            file_name: upload.file_name.clone(),
            review_status: DocumentReviewStatus::Pending,
            uploaded_at: now,
        };

        match self.documents.insert(&document).await {
            Ok(record) => {
                log.commit();
                info!(profile_id, %document_type, document_id = %record.id, "Document uploaded");
                Ok(record)
            }
            Err(err) => {
                let leftover = log.unwind(self.storage.as_ref()).await;
                warn!(
                    profile_id,
                    %document_type,
                    error = %err,
                    orphaned = leftover.len(),
                    "Document metadata insert failed; upload rolled back"
                );
                Err(SolaceError::DocumentUpload(format!("{}: {err}", upload.file_name)))
            }
        }
    }

    /// Extension row and documents for a profile
    ///
    /// # Errors
    /// Propagates either store's read error.
    pub async fn load(
        &self,
        profile_id: &str,
    ) -> Result<(Option<CounselorExtensionRow>, Vec<DocumentRecord>)> {
        let (row, documents) =
            tokio::join!(self.profiles.fetch(profile_id), self.documents.list(profile_id));
        Ok((row?, documents?))
    }

    /// Current record of `document_type`: latest upload, then highest id
    #[must_use]
    pub fn current_document(
        documents: &[DocumentRecord],
        document_type: DocumentType,
    ) -> Option<&DocumentRecord> {
        current_document(documents, document_type)
    }

    /// Time-limited download link for a stored document
    ///
    /// # Errors
    /// Propagates the storage error.
    pub async fn document_url(&self, record: &DocumentRecord) -> Result<String> {
        self.storage.create_signed_url(&self.bucket, &record.storage_path, self.signed_url_ttl).await
    }

    /// Public url for an object in the documents bucket
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        self.storage.public_url(&self.bucket, path)
    }
}

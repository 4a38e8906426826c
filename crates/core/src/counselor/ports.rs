//! Port interfaces for counselor extension rows, documents and file storage

use std::time::Duration;

use async_trait::async_trait;
use solace_domain::{
    CounselorExtensionRow, DocumentRecord, DocumentType, JsonMap, NewDocument, Result,
};

/// Row-level access to `counselor_profiles`, keyed by profile id
#[async_trait]
pub trait CounselorProfileStore: Send + Sync {
    async fn fetch(&self, profile_id: &str) -> Result<Option<CounselorExtensionRow>>;

    /// Insert a new row; `payload` carries `profile_id`
    async fn insert(&self, payload: &JsonMap) -> Result<()>;

    async fn update(&self, profile_id: &str, payload: &JsonMap) -> Result<()>;
}

/// Row-level access to `counselor_documents`
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, profile_id: &str) -> Result<Vec<DocumentRecord>>;

    async fn insert(&self, document: &NewDocument) -> Result<DocumentRecord>;

    /// Delete every record of `document_type`, returning what was removed
    async fn delete_by_type(
        &self,
        profile_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<DocumentRecord>>;
}

/// Object storage
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` at `path`, returning the stored path
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn create_signed_url(&self, bucket: &str, path: &str, ttl: Duration) -> Result<String>;
}

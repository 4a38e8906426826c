//! `counselor_documents` over the REST gateway

use std::sync::Arc;

use async_trait::async_trait;
use solace_core::counselor::DocumentStore;
use solace_domain::constants::COUNSELOR_DOCUMENTS_TABLE;
use solace_domain::{DocumentRecord, DocumentType, NewDocument, Result};
use tracing::info;

use super::table::RestTable;
use crate::http::BackendClient;
use crate::identity::SessionManager;

#[derive(Debug, Clone)]
pub struct RestDocumentStore {
    table: RestTable,
}

impl RestDocumentStore {
    pub fn new(backend: BackendClient, sessions: Arc<SessionManager>) -> Self {
        Self { table: RestTable::new(backend, sessions, COUNSELOR_DOCUMENTS_TABLE) }
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn list(&self, profile_id: &str) -> Result<Vec<DocumentRecord>> {
        self.table.select_eq("profile_id", profile_id).await
    }

    async fn insert(&self, document: &NewDocument) -> Result<DocumentRecord> {
        let record: DocumentRecord = self.table.insert_returning(document).await?;
        info!(
            profile_id = %record.profile_id,
            document_id = %record.id,
            document_type = %record.document_type,
            "Document recorded"
        );
        Ok(record)
    }

    async fn delete_by_type(
        &self,
        profile_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<DocumentRecord>> {
        self.table
            .delete_eq(&[("profile_id", profile_id), ("document_type", document_type.as_str())])
            .await
    }
}

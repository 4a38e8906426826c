//! In-memory row stores and object storage
//!
//! Rows are kept as raw JSON maps and decoded on read, so lenient column
//! decoding is exercised the same way a remote store would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use solace_core::counselor::{CounselorProfileStore, DocumentStore, FileStorage};
use solace_core::profile::ProfileStore;
use solace_domain::{
    CounselorExtensionRow, DocumentRecord, DocumentType, JsonMap, NewDocument, ProfileRow, Result,
    SolaceError,
};

/// Keyed JSON rows with failure switches
#[derive(Default)]
struct Rows {
    rows: Mutex<HashMap<String, JsonMap>>,
    writes: Mutex<Vec<JsonMap>>,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    hang_reads: AtomicBool,
}

impl Rows {
    fn seed(&self, key: &str, row: Value) {
        if let Value::Object(row) = row {
            self.rows.lock().insert(key.to_string(), row);
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        if self.hang_reads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SolaceError::Database("connection reset".into()));
        }
        Ok(self.rows.lock().get(key).cloned().map(Value::Object))
    }

    fn insert(&self, key_column: &str, payload: &JsonMap) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SolaceError::Database("insert rejected".into()));
        }
        let key = payload
            .get(key_column)
            .and_then(Value::as_str)
            .ok_or_else(|| SolaceError::InvalidInput(format!("insert without {key_column}")))?
            .to_string();
        let mut rows = self.rows.lock();
        if rows.contains_key(&key) {
            return Err(SolaceError::Database(format!("duplicate key {key}")));
        }
        rows.insert(key, payload.clone());
        self.writes.lock().push(payload.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update(&self, key: &str, payload: &JsonMap) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SolaceError::Database("update rejected".into()));
        }
        if let Some(row) = self.rows.lock().get_mut(key) {
            row.extend(payload.clone());
        }
        self.writes.lock().push(payload.clone());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// `profiles` keyed by `id`
#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Rows,
}

impl MemoryProfileStore {
    pub fn seed(&self, row: Value) {
        let id = row.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
        self.rows.seed(&id, row);
    }

    pub fn raw(&self, id: &str) -> Option<JsonMap> {
        self.rows.rows.lock().get(id).cloned()
    }

    /// Every insert/update payload, in order
    pub fn writes(&self) -> Vec<JsonMap> {
        self.rows.writes.lock().clone()
    }

    pub fn insert_count(&self) -> usize {
        self.rows.inserts.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.rows.updates.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.rows.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.rows.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn hang_reads(&self, hang: bool) {
        self.rows.hang_reads.store(hang, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch(&self, id: &str) -> Result<Option<ProfileRow>> {
        match self.rows.get(id).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, payload: &JsonMap) -> Result<()> {
        self.rows.insert("id", payload)
    }

    async fn update(&self, id: &str, payload: &JsonMap) -> Result<()> {
        self.rows.update(id, payload)
    }
}

/// `counselor_profiles` keyed by `profile_id`
#[derive(Default)]
pub struct MemoryCounselorStore {
    rows: Rows,
}

impl MemoryCounselorStore {
    pub fn seed(&self, row: Value) {
        let id = row.get("profile_id").and_then(Value::as_str).unwrap_or_default().to_string();
        self.rows.seed(&id, row);
    }

    pub fn raw(&self, profile_id: &str) -> Option<JsonMap> {
        self.rows.rows.lock().get(profile_id).cloned()
    }

    pub fn writes(&self) -> Vec<JsonMap> {
        self.rows.writes.lock().clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.rows.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.rows.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CounselorProfileStore for MemoryCounselorStore {
    async fn fetch(&self, profile_id: &str) -> Result<Option<CounselorExtensionRow>> {
        match self.rows.get(profile_id).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, payload: &JsonMap) -> Result<()> {
        self.rows.insert("profile_id", payload)
    }

    async fn update(&self, profile_id: &str, payload: &JsonMap) -> Result<()> {
        self.rows.update(profile_id, payload)
    }
}

/// `counselor_documents` with sequential ids
#[derive(Default)]
pub struct MemoryDocumentStore {
    records: Mutex<Vec<DocumentRecord>>,
    next_id: AtomicUsize,
    fail_inserts: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn seed(&self, record: DocumentRecord) {
        self.records.lock().push(record);
    }

    pub fn records(&self) -> Vec<DocumentRecord> {
        self.records.lock().clone()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, profile_id: &str) -> Result<Vec<DocumentRecord>> {
        Ok(self.records.lock().iter().filter(|r| r.profile_id == profile_id).cloned().collect())
    }

    async fn insert(&self, document: &NewDocument) -> Result<DocumentRecord> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(SolaceError::Database("document insert rejected".into()));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = DocumentRecord {
            id: format!("doc-{n:04}"),
            profile_id: document.profile_id.clone(),
            document_type: document.document_type,
            storage_path: document.storage_path.clone(),
            file_name: document.file_name.clone(),
            review_status: Some(document.review_status),
            uploaded_at: Some(document.uploaded_at),
        };
        self.records.lock().push(record.clone());
        Ok(record)
    }

    async fn delete_by_type(
        &self,
        profile_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<DocumentRecord>> {
        let mut records = self.records.lock();
        let (removed, kept): (Vec<_>, Vec<_>) = records
            .drain(..)
            .partition(|r| r.profile_id == profile_id && r.document_type == document_type);
        *records = kept;
        Ok(removed)
    }
}

/// Object storage keyed by `bucket/path`
#[derive(Default)]
pub struct MemoryFileStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: AtomicBool,
}

impl MemoryFileStorage {
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.objects.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(SolaceError::TransientSource("storage unavailable".into()));
        }
        self.objects.lock().insert(format!("{bucket}/{path}"), bytes);
        Ok(path.to_string())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.lock();
        for path in paths {
            objects.remove(&format!("{bucket}/{path}"));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }

    async fn create_signed_url(&self, bucket: &str, path: &str, ttl: Duration) -> Result<String> {
        Ok(format!("memory://{bucket}/{path}?expires_in={}", ttl.as_secs()))
    }
}

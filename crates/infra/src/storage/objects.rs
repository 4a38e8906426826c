//! Bucketed object storage over the storage REST API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use solace_core::counselor::FileStorage;
use solace_domain::{Result, SolaceError};
use tracing::{debug, info};

use crate::http::{ensure_success, read_json, BackendClient};
use crate::identity::SessionManager;

const OBJECT_PATH: &str = "storage/v1/object";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

fn encode_path(path: &str) -> String {
    path.split('/').map(|segment| urlencoding::encode(segment).into_owned()).collect::<Vec<_>>().join("/")
}

#[derive(Debug, Clone)]
pub struct ObjectStorage {
    backend: BackendClient,
    sessions: Arc<SessionManager>,
}

impl ObjectStorage {
    pub fn new(backend: BackendClient, sessions: Arc<SessionManager>) -> Self {
        Self { backend, sessions }
    }

    fn token(&self) -> Option<String> {
        self.sessions.access_token()
    }
}

#[async_trait]
impl FileStorage for ObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        if bytes.is_empty() {
            return Err(SolaceError::InvalidInput(format!("refusing empty upload to {path}")));
        }
        let size = bytes.len();
        let token = self.token();
        let request = self
            .backend
            .request(Method::POST, &format!("{OBJECT_PATH}/{bucket}/{}", encode_path(path)), token.as_deref())?
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        let response = self.backend.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SolaceError::DocumentUpload(format!(
                "{bucket}/{path}: {} ({status})",
                crate::errors::error_message(&body)
            )));
        }
        let uploaded: UploadResponse = read_json(response).await?;
        info!(bucket, path, size, key = ?uploaded.key, "Object uploaded");
        Ok(path.to_string())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let token = self.token();
        let request = self
            .backend
            .request(Method::DELETE, &format!("{OBJECT_PATH}/{bucket}"), token.as_deref())?
            .json(&json!({ "prefixes": paths }));
        ensure_success(self.backend.send(request).await?).await?;
        debug!(bucket, count = paths.len(), "Objects removed");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        let relative = format!("{OBJECT_PATH}/public/{bucket}/{}", encode_path(path));
        self.backend
            .endpoint(&relative)
            .map_or_else(|_| format!("{}{relative}", self.backend.base_url()), |url| url.to_string())
    }

    async fn create_signed_url(&self, bucket: &str, path: &str, ttl: Duration) -> Result<String> {
        let token = self.token();
        let request = self
            .backend
            .request(
                Method::POST,
                &format!("{OBJECT_PATH}/sign/{bucket}/{}", encode_path(path)),
                token.as_deref(),
            )?
            .json(&json!({ "expiresIn": ttl.as_secs() }));
        let signed: SignedUrlResponse = read_json(self.backend.send(request).await?).await?;
        // Returned path is relative to the storage root
        let relative = format!("storage/v1/{}", signed.signed_url.trim_start_matches('/'));
        Ok(self.backend.endpoint(&relative)?.to_string())
    }
}

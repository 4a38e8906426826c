//! Authenticated access to the hosted backend
//!
//! Every request carries the project `apikey` header. The bearer token is the
//! signed-in user's access token when one is known, else the anon key.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use solace_domain::{BackendConfig, Result, SolaceError};
use url::Url;

use super::client::HttpClient;
use crate::errors::{status_error, InfraError};

#[derive(Clone)]
pub struct BackendClient {
    http: HttpClient,
    base_url: Url,
    anon_key: String,
}

impl BackendClient {
    /// # Errors
    /// Returns `SolaceError::Config` for a missing or malformed url or key.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        config.ensure_configured()?;
        let base_url = Url::parse(&format!("{}/", config.base_url())).map_err(InfraError::from)?;
        let http = HttpClient::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("solace/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url, anon_key: config.anon_key.clone() })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute url for a path relative to the backend root
    ///
    /// # Errors
    /// Returns `SolaceError::Config` if `path` does not form a valid url.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/')).map_err(InfraError::from)?)
    }

    /// Request with the `apikey` header and a bearer token
    ///
    /// # Errors
    /// Returns `SolaceError::Config` if `path` does not form a valid url.
    pub fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key)))
    }

    /// # Errors
    /// Returns a transient error for network failures.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        self.http.send(builder).await
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient").field("base_url", &self.base_url.as_str()).finish()
    }
}

/// Pass a successful response through, mapping anything else by status
///
/// # Errors
/// Returns the status-mapped error with the body's message.
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// Decode a successful JSON response
///
/// # Errors
/// Returns the status-mapped error, or `SolaceError::Serialization` for an
/// undecodable body.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(InfraError::from)?;
    serde_json::from_slice(&bytes).map_err(|e| SolaceError::Serialization(e.to_string()))
}

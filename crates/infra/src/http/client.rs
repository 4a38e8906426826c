//! Retrying HTTP client
//!
//! Connection failures are retried for every method, since the request never
//! reached the server. Server errors and timeouts are retried only for
//! idempotent methods, so a slow insert or upload is never sent twice.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use solace_domain::{Result, SolaceError};
use tracing::debug;

use crate::errors::InfraError;

#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Execute with retries; non-2xx responses are returned, not raised
    ///
    /// # Errors
    /// `SolaceError::TransientSource` once retries are exhausted on network
    /// failure, `SolaceError::Internal` for a body that cannot be replayed.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut attempt = 1;
        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| SolaceError::Internal("streaming request body cannot be retried".into()))?
                .build()
                .map_err(InfraError::from)?;
            let method = request.method().clone();
            let path = request.url().path().to_string();
            let idempotent = is_idempotent(&method);
            let last = attempt >= self.max_attempts;

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, path = %path, %status, "HTTP response");
                    if !(status.is_server_error() && idempotent) || last {
                        return Ok(response);
                    }
                }
                Err(err) => {
                    debug!(attempt, %method, path = %path, error = %err, "HTTP request failed");
                    let retryable = err.is_connect() || (idempotent && err.is_timeout());
                    if !retryable || last {
                        return Err(InfraError::from(err).into());
                    }
                }
            }

            tokio::time::sleep(self.backoff(attempt)).await;
            attempt += 1;
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let doublings = u32::try_from(attempt.saturating_sub(1).min(6)).unwrap_or(6);
        self.base_backoff.saturating_mul(1 << doublings)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("max_attempts", &self.max_attempts)
            .field("base_backoff", &self.base_backoff)
            .finish_non_exhaustive()
    }
}

fn is_idempotent(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::PUT, Method::DELETE, Method::OPTIONS].contains(method)
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 2,
            base_backoff: Duration::from_millis(150),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts, first try included
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub const fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns `SolaceError::Internal` if the TLS backend cannot initialise.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(InfraError::from)?;

        Ok(HttpClient { client, max_attempts: self.max_attempts, base_backoff: self.base_backoff })
    }
}

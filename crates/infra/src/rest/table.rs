//! Row access to one relational table over the REST gateway
//!
//! Filters use the gateway's `column=eq.value` syntax. Requests run as the
//! signed-in user when a session is held, so row-level policies apply.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use solace_domain::{Result, SolaceError};
use tracing::debug;

use crate::http::{ensure_success, read_json, BackendClient};
use crate::identity::SessionManager;

const PREFER_MINIMAL: &str = "return=minimal";
const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Clone)]
pub struct RestTable {
    backend: BackendClient,
    sessions: Arc<SessionManager>,
    table: &'static str,
}

impl RestTable {
    pub fn new(backend: BackendClient, sessions: Arc<SessionManager>, table: &'static str) -> Self {
        Self { backend, sessions, table }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.table
    }

    fn request(&self, method: Method, query: &str) -> Result<RequestBuilder> {
        let token = self.sessions.access_token();
        let path = if query.is_empty() {
            format!("rest/v1/{}", self.table)
        } else {
            format!("rest/v1/{}?{query}", self.table)
        };
        self.backend.request(method, &path, token.as_deref())
    }

    /// Rows where `column` equals `value`
    pub async fn select_eq<T: DeserializeOwned>(&self, column: &str, value: &str) -> Result<Vec<T>> {
        let query = format!("select=*&{column}=eq.{}", urlencoding::encode(value));
        let request = self.request(Method::GET, &query)?;
        let rows: Vec<T> = read_json(self.backend.send(request).await?).await?;
        debug!(table = self.table, column, rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    /// First row where `column` equals `value`
    pub async fn select_one<T: DeserializeOwned>(&self, column: &str, value: &str) -> Result<Option<T>> {
        Ok(self.select_eq(column, value).await?.into_iter().next())
    }

    pub async fn insert<B: Serialize + ?Sized>(&self, body: &B) -> Result<()> {
        let request =
            self.request(Method::POST, "")?.header("Prefer", PREFER_MINIMAL).json(body);
        ensure_success(self.backend.send(request).await?).await?;
        debug!(table = self.table, "Inserted row");
        Ok(())
    }

    /// Insert and read back the stored row
    pub async fn insert_returning<B, T>(&self, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request =
            self.request(Method::POST, "")?.header("Prefer", PREFER_REPRESENTATION).json(body);
        let rows: Vec<T> = read_json(self.backend.send(request).await?).await?;
        rows.into_iter().next().ok_or_else(|| {
            SolaceError::Internal(format!("insert into {} returned no row", self.table))
        })
    }

    /// Assign `body` on rows where `column` equals `value`
    pub async fn update_eq<B: Serialize + ?Sized>(&self, column: &str, value: &str, body: &B) -> Result<()> {
        let query = format!("{column}=eq.{}", urlencoding::encode(value));
        let request =
            self.request(Method::PATCH, &query)?.header("Prefer", PREFER_MINIMAL).json(body);
        ensure_success(self.backend.send(request).await?).await?;
        debug!(table = self.table, column, "Updated rows");
        Ok(())
    }

    /// Delete rows matching every `(column, value)` pair, returning them
    pub async fn delete_eq<T: DeserializeOwned>(&self, filters: &[(&str, &str)]) -> Result<Vec<T>> {
        let query = filters
            .iter()
            .map(|(column, value)| format!("{column}=eq.{}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let request =
            self.request(Method::DELETE, &query)?.header("Prefer", PREFER_REPRESENTATION);
        let rows: Vec<T> = read_json(self.backend.send(request).await?).await?;
        debug!(table = self.table, rows = rows.len(), "Deleted rows");
        Ok(rows)
    }
}

impl std::fmt::Debug for RestTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTable").field("table", &self.table).finish_non_exhaustive()
    }
}

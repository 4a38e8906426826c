//! Port interface for the `profiles` table

use async_trait::async_trait;
use solace_domain::{JsonMap, ProfileRow, Result};

/// Row-level access to `profiles`, keyed by identity id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Select one row
    async fn fetch(&self, id: &str) -> Result<Option<ProfileRow>>;

    /// Insert a new row; `payload` carries `id`
    async fn insert(&self, payload: &JsonMap) -> Result<()>;

    /// Assign the columns in `payload` on row `id`
    async fn update(&self, id: &str, payload: &JsonMap) -> Result<()>;
}

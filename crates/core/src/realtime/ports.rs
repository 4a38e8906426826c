//! Port interface for the push change feed

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solace_domain::Result;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row change reported by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    /// Key of the changed row (`id`, or `profile_id` for extension tables)
    pub row_id: Option<String>,
    #[serde(default)]
    pub record: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Change(ChangeEvent),
    /// Channel-level failure; the subscription may still deliver later changes
    Error(String),
}

/// Table + row filter for a subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelFilter {
    pub table: String,
    pub row_id: String,
}

impl ChannelFilter {
    pub fn new(table: impl Into<String>, row_id: impl Into<String>) -> Self {
        Self { table: table.into(), row_id: row_id.into() }
    }

    #[must_use]
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.table && event.row_id.as_deref() == Some(self.row_id.as_str())
    }
}

/// Live subscription; dropping it unsubscribes
#[derive(Debug)]
pub struct Subscription {
    pub filter: ChannelFilter,
    pub messages: mpsc::Receiver<FeedMessage>,
}

#[async_trait]
pub trait RealtimeFeed: Send + Sync {
    async fn subscribe(&self, filter: ChannelFilter) -> Result<Subscription>;
}

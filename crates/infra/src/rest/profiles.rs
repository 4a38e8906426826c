//! `profiles` and `counselor_profiles` over the REST gateway
//!
//! Successful writes are announced on an attached [`RealtimeHub`], so
//! subscribers see rows change without a backend push channel.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use solace_core::counselor::CounselorProfileStore;
use solace_core::profile::ProfileStore;
use solace_core::realtime::{ChangeEvent, ChangeKind};
use solace_domain::constants::{COUNSELOR_PROFILES_TABLE, PROFILES_TABLE};
use solace_domain::{CounselorExtensionRow, JsonMap, ProfileRow, Result};

use super::table::RestTable;
use crate::http::BackendClient;
use crate::identity::SessionManager;
use crate::realtime::RealtimeHub;

/// Publishes committed writes for one table
#[derive(Debug, Clone)]
struct ChangeAnnouncer {
    table: &'static str,
    key: &'static str,
    hub: Option<RealtimeHub>,
}

impl ChangeAnnouncer {
    fn announce(&self, kind: ChangeKind, row_id: Option<&str>, payload: &JsonMap) {
        let Some(hub) = &self.hub else { return };
        let row_id = row_id
            .map(str::to_string)
            .or_else(|| payload.get(self.key).and_then(Value::as_str).map(str::to_string));
        hub.publish(ChangeEvent {
            table: self.table.to_string(),
            kind,
            row_id,
            record: Some(Value::Object(payload.clone())),
        });
    }
}

#[derive(Debug, Clone)]
pub struct RestProfileStore {
    table: RestTable,
    changes: ChangeAnnouncer,
}

impl RestProfileStore {
    pub fn new(backend: BackendClient, sessions: Arc<SessionManager>) -> Self {
        Self {
            table: RestTable::new(backend, sessions, PROFILES_TABLE),
            changes: ChangeAnnouncer { table: PROFILES_TABLE, key: "id", hub: None },
        }
    }

    /// Announce committed writes on `hub`
    #[must_use]
    pub fn with_changes(mut self, hub: RealtimeHub) -> Self {
        self.changes.hub = Some(hub);
        self
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn fetch(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.table.select_one("id", id).await
    }

    async fn insert(&self, payload: &JsonMap) -> Result<()> {
        self.table.insert(payload).await?;
        self.changes.announce(ChangeKind::Insert, None, payload);
        Ok(())
    }

    async fn update(&self, id: &str, payload: &JsonMap) -> Result<()> {
        self.table.update_eq("id", id, payload).await?;
        self.changes.announce(ChangeKind::Update, Some(id), payload);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RestCounselorProfileStore {
    table: RestTable,
    changes: ChangeAnnouncer,
}

impl RestCounselorProfileStore {
    pub fn new(backend: BackendClient, sessions: Arc<SessionManager>) -> Self {
        Self {
            table: RestTable::new(backend, sessions, COUNSELOR_PROFILES_TABLE),
            changes: ChangeAnnouncer {
                table: COUNSELOR_PROFILES_TABLE,
                key: "profile_id",
                hub: None,
            },
        }
    }

    /// Announce committed writes on `hub`
    #[must_use]
    pub fn with_changes(mut self, hub: RealtimeHub) -> Self {
        self.changes.hub = Some(hub);
        self
    }
}

#[async_trait]
impl CounselorProfileStore for RestCounselorProfileStore {
    async fn fetch(&self, profile_id: &str) -> Result<Option<CounselorExtensionRow>> {
        self.table.select_one("profile_id", profile_id).await
    }

    async fn insert(&self, payload: &JsonMap) -> Result<()> {
        self.table.insert(payload).await?;
        self.changes.announce(ChangeKind::Insert, None, payload);
        Ok(())
    }

    async fn update(&self, profile_id: &str, payload: &JsonMap) -> Result<()> {
        self.table.update_eq("profile_id", profile_id, payload).await?;
        self.changes.announce(ChangeKind::Update, Some(profile_id), payload);
        Ok(())
    }
}

//! Push-driven refresh of the canonical user
//!
//! Row changes for the signed-in user trigger a re-read through the session
//! resolver. Overlapping triggers collapse into the refresh already running;
//! that refresh re-reads the store, so it observes every change committed
//! before it lands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use solace_domain::constants::{COUNSELOR_PROFILES_TABLE, PROFILES_TABLE};
use solace_domain::Result;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ports::{ChangeKind, ChannelFilter, FeedMessage, RealtimeFeed};

/// Something that can re-read the current user
#[async_trait]
pub trait UserRefresher: Send + Sync {
    fn current_user_id(&self) -> Option<String>;

    async fn refresh_user(&self) -> Result<()>;
}

/// How a message was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Delete, error, or another user's row
    Ignored,
    /// A refresh was already running
    Coalesced,
    /// A refresh was started
    Refreshing,
}

struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct RealtimeBridge {
    feed: Arc<dyn RealtimeFeed>,
    refresher: Arc<dyn UserRefresher>,
    in_flight: Arc<AtomicBool>,
}

impl RealtimeBridge {
    pub fn new(feed: Arc<dyn RealtimeFeed>, refresher: Arc<dyn UserRefresher>) -> Self {
        Self { feed, refresher, in_flight: Arc::new(AtomicBool::new(false)) }
    }

    /// Subscribe to `user_id`'s profile and counselor rows
    ///
    /// # Errors
    /// Propagates a subscription failure; events already flowing are unaffected.
    pub async fn start(&self, user_id: &str) -> Result<BridgeHandle> {
        let mut tasks = Vec::with_capacity(2);
        for table in [PROFILES_TABLE, COUNSELOR_PROFILES_TABLE] {
            let mut subscription = self.feed.subscribe(ChannelFilter::new(table, user_id)).await?;
            let bridge = self.clone();
            tasks.push(tokio::spawn(async move {
                while let Some(message) = subscription.messages.recv().await {
                    bridge.dispatch(message);
                }
                debug!(table = %subscription.filter.table, "Realtime subscription closed");
            }));
        }
        debug!(user_id, "Realtime bridge started");
        Ok(BridgeHandle { tasks })
    }

    /// Handle one feed message; refreshes run on a spawned task
    pub fn dispatch(&self, message: FeedMessage) -> Dispatch {
        let event = match message {
            FeedMessage::Error(error) => {
                warn!(%error, "Realtime subscription error");
                return Dispatch::Ignored;
            }
            FeedMessage::Change(event) => event,
        };

        if event.kind == ChangeKind::Delete {
            return Dispatch::Ignored;
        }

        let current = self.refresher.current_user_id();
        if current.is_none() || event.row_id != current {
            debug!(table = %event.table, row_id = ?event.row_id, "Ignoring change for another user");
            return Dispatch::Ignored;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(table = %event.table, "Refresh already in flight; coalescing");
            return Dispatch::Coalesced;
        }

        let guard = InFlight(Arc::clone(&self.in_flight));
        let refresher = Arc::clone(&self.refresher);
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(err) = refresher.refresh_user().await {
                warn!(error = %err, "Realtime refresh failed");
            }
        });
        Dispatch::Refreshing
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Running subscriptions; dropping the handle stops them
#[derive(Debug)]
pub struct BridgeHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl BridgeHandle {
    pub fn stop(self) {}
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

//! In-memory change feed

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use solace_core::realtime::{
    ChangeEvent, ChangeKind, ChannelFilter, FeedMessage, RealtimeFeed, Subscription,
};
use solace_domain::{Result, SolaceError};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct MockRealtimeFeed {
    subscribers: Mutex<Vec<(ChannelFilter, mpsc::Sender<FeedMessage>)>>,
    refuse: AtomicBool,
}

impl MockRealtimeFeed {
    pub fn refuse_subscriptions(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().iter().filter(|(_, tx)| !tx.is_closed()).count()
    }

    /// Deliver a change to every matching subscription
    pub async fn emit(&self, table: &str, row_id: &str, kind: ChangeKind) {
        let event = ChangeEvent {
            table: table.to_string(),
            kind,
            row_id: Some(row_id.to_string()),
            record: Some(Value::Null),
        };
        let targets: Vec<_> = self
            .subscribers
            .lock()
            .iter()
            .filter(|(filter, _)| filter.matches(&event))
            .map(|(_, tx)| tx.clone())
            .collect();
        for tx in targets {
            let _ = tx.send(FeedMessage::Change(event.clone())).await;
        }
    }
}

#[async_trait]
impl RealtimeFeed for MockRealtimeFeed {
    async fn subscribe(&self, filter: ChannelFilter) -> Result<Subscription> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SolaceError::TransientSource("realtime socket closed".into()));
        }
        let (tx, rx) = mpsc::channel(16);
        self.subscribers.lock().push((filter.clone(), tx));
        Ok(Subscription { filter, messages: rx })
    }
}

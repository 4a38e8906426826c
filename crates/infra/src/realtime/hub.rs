//! Fan-out of row changes to filtered subscriptions
//!
//! Changes are published once and delivered to every subscription whose
//! table/row filter matches. A subscriber that falls behind receives a
//! `FeedMessage::Error` and keeps receiving later changes.

use async_trait::async_trait;
use solace_core::realtime::{ChangeEvent, ChannelFilter, FeedMessage, RealtimeFeed, Subscription};
use solace_domain::constants::REALTIME_CHANNEL_CAPACITY;
use solace_domain::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(REALTIME_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a change; returns how many subscriptions saw it
    pub fn publish(&self, event: ChangeEvent) -> usize {
        debug!(table = %event.table, row_id = ?event.row_id, kind = ?event.kind, "Publishing change");
        self.sender.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl RealtimeFeed for RealtimeHub {
    async fn subscribe(&self, filter: ChannelFilter) -> Result<Subscription> {
        let mut changes = self.sender.subscribe();
        let (tx, rx) = mpsc::channel(REALTIME_CHANNEL_CAPACITY);
        let task_filter = filter.clone();

        tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    () = tx.closed() => break,
                    received = changes.recv() => match received {
                        Ok(event) if task_filter.matches(&event) => FeedMessage::Change(event),
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(table = %task_filter.table, skipped, "Subscriber lagged");
                            FeedMessage::Error(format!("missed {skipped} changes"))
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                };
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            debug!(table = %task_filter.table, row_id = %task_filter.row_id, "Subscription closed");
        });

        debug!(table = %filter.table, row_id = %filter.row_id, "Subscribed");
        Ok(Subscription { filter, messages: rx })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use solace_core::realtime::ChangeKind;

    use super::*;

    fn change(table: &str, row_id: &str) -> ChangeEvent {
        ChangeEvent {
            table: table.into(),
            kind: ChangeKind::Update,
            row_id: Some(row_id.into()),
            record: None,
        }
    }

    #[tokio::test]
    async fn delivers_only_matching_changes() {
        let hub = RealtimeHub::new();
        let mut subscription =
            hub.subscribe(ChannelFilter::new("profiles", "u1")).await.unwrap();

        hub.publish(change("profiles", "u2"));
        hub.publish(change("counselor_profiles", "u1"));
        hub.publish(change("profiles", "u1"));

        let message = tokio::time::timeout(Duration::from_secs(1), subscription.messages.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message, FeedMessage::Change(change("profiles", "u1")));
        assert!(subscription.messages.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_the_subscription_releases_the_listener() {
        let hub = RealtimeHub::new();
        let subscription = hub.subscribe(ChannelFilter::new("profiles", "u1")).await.unwrap();
        assert_eq!(hub.subscriber_count(), 1);

        drop(subscription);
        tokio::time::timeout(Duration::from_secs(1), async {
            while hub.subscriber_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_harmless() {
        assert_eq!(RealtimeHub::new().publish(change("profiles", "u1")), 0);
    }
}

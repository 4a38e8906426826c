//! Realtime change feed and the refresh bridge

pub mod bridge;
pub mod ports;

pub use bridge::{BridgeHandle, Dispatch, RealtimeBridge, UserRefresher};
pub use ports::{ChangeEvent, ChangeKind, ChannelFilter, FeedMessage, RealtimeFeed, Subscription};

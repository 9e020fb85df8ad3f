//! Actor tasks behind the admin feeds.
//!
//! # Hierarchy
//!
//! ```text
//! Hub
//! ├── BroadcastActor<Event>   (event log feed)
//! └── BroadcastActor<Visit>   (visit feed)
//!       └── StatsAggregator   (one per Statistics stream)
//! ```
//!
//! Each coordinator owns its subscriber list and is reached only through
//! its handle's mailbox. Cancellation flows down through child tokens.

pub mod aggregator;
pub mod broadcaster;
pub mod hub;
pub mod messages;

pub use aggregator::{stats_period, StatsAggregator};
pub use broadcaster::{BroadcastActor, BroadcastHandle, Subscription};
pub use hub::Hub;
pub use messages::{BroadcastMessage, Feed, FeedStatus, SubscriberId};

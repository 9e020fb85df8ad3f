//! Message types for actor communication.
//!
//! Each feed coordinator has a single mailbox, so publishes and
//! registrations are applied in the order callers enqueued them.
//! Response patterns use `tokio::sync::oneshot` for request-reply semantics.

use tokio::sync::{mpsc, oneshot};

/// Identifier handed to a subscriber when it is registered with a feed.
pub type SubscriberId = u64;

/// The two independent broadcast feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Raw event log (one `Event` per authorized call).
    Events,
    /// Visit records consumed by statistics aggregators.
    Visits,
}

impl Feed {
    /// Returns the feed name for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Feed::Events => "events",
            Feed::Visits => "visits",
        }
    }
}

/// Messages sent to a `BroadcastActor`.
#[derive(Debug)]
pub enum BroadcastMessage<T> {
    /// Deliver a copy of `message` to every registered subscriber.
    Publish { message: T },

    /// Register a subscriber queue.
    Subscribe {
        queue: mpsc::Sender<T>,
        /// Acknowledged once the queue is part of the fan-out list.
        respond_to: oneshot::Sender<SubscriberId>,
    },

    /// Get current feed status (for diagnostics and tests).
    GetStatus {
        respond_to: oneshot::Sender<FeedStatus>,
    },
}

/// Snapshot of a feed coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedStatus {
    pub feed: Feed,
    /// Currently registered subscriber queues.
    pub subscribers: usize,
    /// Messages fanned out since startup.
    pub published: u64,
}

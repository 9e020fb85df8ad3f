//! The two feeds every authorized call is published to.
//!
//! `Hub` is shared by all request handlers. It owns one coordinator for the
//! event log and one for visits; the feeds are independent, so a slow log
//! subscriber never delays statistics and vice versa.

use super::broadcaster::{BroadcastHandle, Subscription};
use super::messages::Feed;
use crate::errors::GatekeeperError;
use crate::models::{Event, Visit};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Hub {
    events: BroadcastHandle<Event>,
    visits: BroadcastHandle<Visit>,
}

impl Hub {
    /// Spawn both feed coordinators under child tokens of `cancel_token`.
    #[must_use]
    pub fn spawn(
        mailbox_capacity: usize,
        cancel_token: &CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (events, events_task) =
            BroadcastHandle::spawn(Feed::Events, mailbox_capacity, cancel_token.child_token());
        let (visits, visits_task) =
            BroadcastHandle::spawn(Feed::Visits, mailbox_capacity, cancel_token.child_token());

        (Self { events, visits }, vec![events_task, visits_task])
    }

    /// Publish one authorized call to both feeds.
    ///
    /// The event is handed over before the visit. Both must be accepted
    /// before the caller's handler runs.
    pub async fn record(&self, event: Event, visit: Visit) -> Result<(), GatekeeperError> {
        self.events.publish(event).await?;
        self.visits.publish(visit).await
    }

    /// Register a log subscriber.
    pub async fn subscribe_events(
        &self,
        capacity: usize,
    ) -> Result<Subscription<Event>, GatekeeperError> {
        self.events.subscribe(capacity).await
    }

    /// Register a statistics subscriber.
    pub async fn subscribe_visits(
        &self,
        capacity: usize,
    ) -> Result<Subscription<Visit>, GatekeeperError> {
        self.visits.subscribe(capacity).await
    }

    #[must_use]
    pub fn events(&self) -> &BroadcastHandle<Event> {
        &self.events
    }

    #[must_use]
    pub fn visits(&self) -> &BroadcastHandle<Visit> {
        &self.visits
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_record_reaches_both_feeds() {
        let cancel_token = CancellationToken::new();
        let (hub, _tasks) = Hub::spawn(16, &cancel_token);

        let mut events = hub.subscribe_events(8).await.unwrap();
        let mut visits = hub.subscribe_visits(8).await.unwrap();

        hub.record(
            Event::new("alice", "/gatekeeper.Biz/Add", "127.0.0.1:1"),
            Visit::new("/gatekeeper.Biz/Add", "alice"),
        )
        .await
        .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.consumer, "alice");
        assert_eq!(event.origin, "127.0.0.1:1");

        let visit = tokio::time::timeout(Duration::from_secs(1), visits.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(visit, Visit::new("/gatekeeper.Biz/Add", "alice"));

        cancel_token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_feeds_are_independent() {
        let cancel_token = CancellationToken::new();
        let (hub, _tasks) = Hub::spawn(16, &cancel_token);

        // Never drained; stalls the event feed after one message
        let _stuck = hub.subscribe_events(1).await.unwrap();
        let mut visits = hub.subscribe_visits(8).await.unwrap();

        for _ in 0..3 {
            hub.record(
                Event::new("alice", "/gatekeeper.Biz/Add", "unknown"),
                Visit::new("/gatekeeper.Biz/Add", "alice"),
            )
            .await
            .unwrap();
        }

        for _ in 0..3 {
            tokio::time::timeout(Duration::from_secs(1), visits.recv())
                .await
                .expect("visit feed must not wait on the event feed")
                .unwrap();
        }

        cancel_token.cancel();
    }

    #[tokio::test]
    async fn test_cancel_stops_both_feeds() {
        let cancel_token = CancellationToken::new();
        let (hub, tasks) = Hub::spawn(16, &cancel_token);
        assert_eq!(tasks.len(), 2);

        cancel_token.cancel();
        for task in tasks {
            tokio::time::timeout(Duration::from_secs(1), task)
                .await
                .unwrap()
                .unwrap();
        }

        let result = hub
            .record(
                Event::new("alice", "/gatekeeper.Biz/Add", "unknown"),
                Visit::new("/gatekeeper.Biz/Add", "alice"),
            )
            .await;
        assert!(matches!(result, Err(GatekeeperError::ShuttingDown)));
    }
}

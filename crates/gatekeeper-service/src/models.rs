//! Records produced by authorized calls and the statistics window.
//!
//! These are transport-independent; conversions into the wire messages live
//! here so actors never depend on generated types.

use proto_gen::gatekeeper as pb;
use std::collections::HashMap;

/// One authorized call, broadcast to log subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub consumer: String,
    /// Fully-qualified method path, e.g. `/gatekeeper.Biz/Add`.
    pub method: String,
    /// Peer address of the caller, or `unknown`.
    pub origin: String,
    /// Unix seconds at emission.
    pub timestamp: i64,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(
        consumer: impl Into<String>,
        method: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            consumer: consumer.into(),
            method: method.into(),
            origin: origin.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl From<Event> for pb::Event {
    fn from(event: Event) -> Self {
        pb::Event {
            timestamp: event.timestamp,
            consumer: event.consumer,
            method: event.method,
            origin: event.origin,
        }
    }
}

/// Lightweight (method, consumer) record used only for statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub method: String,
    pub consumer: String,
}

impl Visit {
    #[must_use]
    pub fn new(method: impl Into<String>, consumer: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            consumer: consumer.into(),
        }
    }
}

/// Per-window visit counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatWindow {
    pub by_method: HashMap<String, u64>,
    pub by_consumer: HashMap<String, u64>,
}

impl StatWindow {
    /// Count one visit.
    pub fn record(&mut self, visit: &Visit) {
        *self.by_method.entry(visit.method.clone()).or_insert(0) += 1;
        *self.by_consumer.entry(visit.consumer.clone()).or_insert(0) += 1;
    }

    /// Hand out the current counts and start a fresh window.
    pub fn take(&mut self) -> StatWindow {
        std::mem::take(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty() && self.by_consumer.is_empty()
    }
}

/// A flushed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSnapshot {
    /// Unix seconds at flush.
    pub timestamp: i64,
    pub window: StatWindow,
}

impl From<StatSnapshot> for pb::Stat {
    fn from(snapshot: StatSnapshot) -> Self {
        pb::Stat {
            timestamp: snapshot.timestamp,
            by_method: snapshot.window.by_method,
            by_consumer: snapshot.window.by_consumer,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_window_counts_and_resets() {
        let mut window = StatWindow::default();
        window.record(&Visit::new("Add", "alice"));
        window.record(&Visit::new("Add", "alice"));
        window.record(&Visit::new("Check", "bob"));

        let flushed = window.take();
        assert_eq!(flushed.by_method.get("Add"), Some(&2));
        assert_eq!(flushed.by_method.get("Check"), Some(&1));
        assert_eq!(flushed.by_consumer.get("alice"), Some(&2));
        assert_eq!(flushed.by_consumer.get("bob"), Some(&1));

        assert!(window.is_empty(), "window must be empty after take()");
    }

    #[test]
    fn test_event_to_wire() {
        let event = Event::new("alice", "/gatekeeper.Biz/Add", "127.0.0.1:40000");
        let stamped = event.timestamp;
        let wire: pb::Event = event.into();

        assert_eq!(wire.consumer, "alice");
        assert_eq!(wire.method, "/gatekeeper.Biz/Add");
        assert_eq!(wire.origin, "127.0.0.1:40000");
        assert_eq!(wire.timestamp, stamped);
        assert!(wire.timestamp > 0);
    }

    #[test]
    fn test_snapshot_to_wire() {
        let mut window = StatWindow::default();
        window.record(&Visit::new("/gatekeeper.Biz/Test", "ops"));

        let wire: pb::Stat = StatSnapshot {
            timestamp: 1_700_000_000,
            window,
        }
        .into();

        assert_eq!(wire.timestamp, 1_700_000_000);
        assert_eq!(wire.by_method.get("/gatekeeper.Biz/Test"), Some(&1));
        assert_eq!(wire.by_consumer.get("ops"), Some(&1));
    }
}

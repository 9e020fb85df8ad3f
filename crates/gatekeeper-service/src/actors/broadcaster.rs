//! `BroadcastActor` - single-owner fan-out coordinator for one feed.
//!
//! The actor is the only code that touches the subscriber list, so no lock
//! guards it. Producers and new subscribers talk to it through one ordered
//! mailbox:
//!
//! - `Publish`: the message is pushed to every registered queue with an
//!   awaiting send. A full queue blocks the coordinator, which stalls the
//!   whole feed until that subscriber drains. Nothing is dropped.
//! - `Subscribe`: the queue is appended and the caller is acknowledged.
//!   Only messages published after the acknowledgement are observed.
//!
//! Queues whose receiving side has gone away are removed, either when a
//! send to them fails or by the prune that precedes every fan-out.
//!
//! On cancellation the actor stops immediately, including while it is
//! blocked on a slow subscriber, and drops all queues without draining.

use super::messages::{BroadcastMessage, Feed, FeedStatus, SubscriberId};
use crate::errors::GatekeeperError;
use crate::observability::metrics;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Handle to a `BroadcastActor`.
///
/// Cheap to clone; every clone feeds the same coordinator.
#[derive(Debug)]
pub struct BroadcastHandle<T> {
    sender: mpsc::Sender<BroadcastMessage<T>>,
}

impl<T> Clone for BroadcastHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> BroadcastHandle<T>
where
    T: Clone + Send + 'static,
{
    /// Spawn a coordinator for `feed` and return a handle to it.
    ///
    /// # Arguments
    ///
    /// * `feed` - Feed this coordinator serves (for logs and metrics)
    /// * `mailbox_capacity` - Bound of the coordinator's inbound mailbox
    /// * `cancel_token` - Stops the coordinator when cancelled
    #[must_use]
    pub fn spawn(
        feed: Feed,
        mailbox_capacity: usize,
        cancel_token: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(mailbox_capacity.max(1));
        let actor = BroadcastActor::new(feed, receiver, cancel_token);
        let task_handle = tokio::spawn(actor.run());

        (Self { sender }, task_handle)
    }

    /// Hand a message to the coordinator for fan-out.
    ///
    /// Waits while the mailbox is full.
    pub async fn publish(&self, message: T) -> Result<(), GatekeeperError> {
        self.sender
            .send(BroadcastMessage::Publish { message })
            .await
            .map_err(|_| GatekeeperError::ShuttingDown)
    }

    /// Register a new subscriber with a private queue of `capacity` messages.
    ///
    /// Returns once the coordinator has added the queue; every message
    /// published after that point is delivered to it.
    pub async fn subscribe(&self, capacity: usize) -> Result<Subscription<T>, GatekeeperError> {
        let (queue, receiver) = mpsc::channel(capacity.max(1));
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(BroadcastMessage::Subscribe {
                queue,
                respond_to: tx,
            })
            .await
            .map_err(|_| GatekeeperError::ShuttingDown)?;

        let id = rx.await.map_err(|_| GatekeeperError::ShuttingDown)?;

        Ok(Subscription { id, receiver })
    }

    /// Get the current coordinator status.
    pub async fn status(&self) -> Result<FeedStatus, GatekeeperError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BroadcastMessage::GetStatus { respond_to: tx })
            .await
            .map_err(|_| GatekeeperError::ShuttingDown)?;

        rx.await.map_err(|_| GatekeeperError::ShuttingDown)
    }
}

/// Receiving side of a registration.
///
/// Dropping it abandons the queue; the coordinator removes it on its next
/// fan-out.
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriberId,
    receiver: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next message, or `None` once the coordinator has stopped.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

/// A registered queue.
struct Subscriber<T> {
    id: SubscriberId,
    queue: mpsc::Sender<T>,
}

/// The `BroadcastActor` implementation.
///
/// Owns the subscriber list and runs the message loop.
pub struct BroadcastActor<T> {
    feed: Feed,
    receiver: mpsc::Receiver<BroadcastMessage<T>>,
    cancel_token: CancellationToken,
    subscribers: Vec<Subscriber<T>>,
    next_id: SubscriberId,
    published: u64,
}

impl<T> BroadcastActor<T>
where
    T: Clone + Send + 'static,
{
    fn new(
        feed: Feed,
        receiver: mpsc::Receiver<BroadcastMessage<T>>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            feed,
            receiver,
            cancel_token,
            subscribers: Vec::new(),
            next_id: 1,
            published: 0,
        }
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "gk.actor.broadcaster", fields(feed = self.feed.as_str()))]
    async fn run(mut self) {
        info!(
            target: "gk.actor.broadcaster",
            feed = self.feed.as_str(),
            "BroadcastActor started"
        );

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "gk.actor.broadcaster",
                        feed = self.feed.as_str(),
                        "BroadcastActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            info!(
                                target: "gk.actor.broadcaster",
                                feed = self.feed.as_str(),
                                "BroadcastActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        metrics::set_feed_subscribers(self.feed.as_str(), 0);

        info!(
            target: "gk.actor.broadcaster",
            feed = self.feed.as_str(),
            subscribers_remaining = self.subscribers.len(),
            published = self.published,
            "BroadcastActor stopped"
        );
    }

    /// Handle a single message.
    async fn handle_message(&mut self, message: BroadcastMessage<T>) {
        match message {
            BroadcastMessage::Publish { message } => {
                self.fan_out(message).await;
            }

            BroadcastMessage::Subscribe { queue, respond_to } => {
                let id = self.register(queue);
                let _ = respond_to.send(id);
            }

            BroadcastMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(FeedStatus {
                    feed: self.feed,
                    subscribers: self.subscribers.len(),
                    published: self.published,
                });
            }
        }
    }

    fn register(&mut self, queue: mpsc::Sender<T>) -> SubscriberId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, queue });

        metrics::set_feed_subscribers(self.feed.as_str(), self.subscribers.len());

        debug!(
            target: "gk.actor.broadcaster",
            feed = self.feed.as_str(),
            subscriber_id = id,
            total_subscribers = self.subscribers.len(),
            "Subscriber registered"
        );

        id
    }

    /// Deliver `message` to every subscriber, in registration order.
    async fn fan_out(&mut self, message: T) {
        let mut removed = self.prune_closed();
        let mut delivered = Vec::with_capacity(self.subscribers.len());

        for subscriber in std::mem::take(&mut self.subscribers) {
            tokio::select! {
                biased;

                // Shutting down: remaining queues are dropped with the actor
                () = self.cancel_token.cancelled() => return,

                result = subscriber.queue.send(message.clone()) => {
                    if result.is_ok() {
                        delivered.push(subscriber);
                    } else {
                        removed += 1;
                        debug!(
                            target: "gk.actor.broadcaster",
                            feed = self.feed.as_str(),
                            subscriber_id = subscriber.id,
                            "Subscriber disconnected, removing"
                        );
                    }
                }
            }
        }

        self.subscribers = delivered;
        self.published += 1;

        metrics::record_feed_message(self.feed.as_str());
        if removed > 0 {
            metrics::record_subscribers_removed(self.feed.as_str(), removed);
            metrics::set_feed_subscribers(self.feed.as_str(), self.subscribers.len());
        }
    }

    /// Drop queues whose receiver is gone. Returns how many were removed.
    fn prune_closed(&mut self) -> usize {
        let before = self.subscribers.len();
        let feed = self.feed;
        self.subscribers.retain(|subscriber| {
            let open = !subscriber.queue.is_closed();
            if !open {
                debug!(
                    target: "gk.actor.broadcaster",
                    feed = feed.as_str(),
                    subscriber_id = subscriber.id,
                    "Subscriber disconnected, removing"
                );
            }
            open
        });
        before - self.subscribers.len()
    }
}

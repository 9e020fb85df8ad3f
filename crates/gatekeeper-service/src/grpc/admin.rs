//! Admin streams: the live event log and periodic statistics.
//!
//! Both streams are backed by a private subscription on one hub feed. A
//! stream ends when the server shuts down or the caller disconnects; in
//! either case the subscription is dropped and the coordinator forgets it.

use crate::actors::{stats_period, Hub, StatsAggregator, Subscription};
use crate::models::Event;

use proto_gen::gatekeeper as pb;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{debug, instrument};

/// Stream type returned by `Logging`.
pub type EventStream = ReceiverStream<Result<pb::Event, Status>>;

/// Stream type returned by `Statistics`.
pub type StatStream = ReceiverStream<Result<pb::Stat, Status>>;

/// Handlers for the admin streams.
#[derive(Debug, Clone)]
pub struct AdminStreams {
    hub: Hub,
    subscriber_capacity: usize,
    shutdown: CancellationToken,
}

impl AdminStreams {
    /// # Arguments
    ///
    /// * `hub` - Feeds to subscribe to
    /// * `subscriber_capacity` - Queue size for each new subscription
    /// * `shutdown` - Parent token; every stream task runs under a child of it
    #[must_use]
    pub fn new(hub: Hub, subscriber_capacity: usize, shutdown: CancellationToken) -> Self {
        Self {
            hub,
            subscriber_capacity: subscriber_capacity.max(1),
            shutdown,
        }
    }

    /// Open a log stream.
    ///
    /// Every call admitted after this returns is delivered, in the order the
    /// hub received it. Nothing earlier is replayed.
    #[instrument(skip_all, name = "gk.grpc.admin.logging")]
    pub async fn logging(
        &self,
        _request: Request<pb::Nothing>,
    ) -> Result<Response<EventStream>, Status> {
        let subscription = self.hub.subscribe_events(self.subscriber_capacity).await?;
        let (tx, rx) = mpsc::channel(self.subscriber_capacity);

        debug!(
            target: "gk.grpc.admin",
            subscriber_id = subscription.id(),
            "Log stream opened"
        );

        tokio::spawn(relay_events(
            subscription,
            tx,
            self.shutdown.child_token(),
        ));

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    /// Open a statistics stream flushing every `interval_seconds`.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for a zero interval; no subscription is created.
    #[instrument(skip_all, name = "gk.grpc.admin.statistics")]
    pub async fn statistics(
        &self,
        request: Request<pb::StatInterval>,
    ) -> Result<Response<StatStream>, Status> {
        let period = stats_period(request.into_inner().interval_seconds)?;
        let subscription = self.hub.subscribe_visits(self.subscriber_capacity).await?;
        let (tx, rx) = mpsc::channel(self.subscriber_capacity);

        debug!(
            target: "gk.grpc.admin",
            subscriber_id = subscription.id(),
            period_secs = period.as_secs(),
            "Statistics stream opened"
        );

        StatsAggregator::<pb::Stat>::spawn(period, subscription, tx, self.shutdown.child_token());

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// Forward events from a feed subscription to one caller.
async fn relay_events(
    mut subscription: Subscription<Event>,
    output: mpsc::Sender<Result<pb::Event, Status>>,
    cancel_token: CancellationToken,
) {
    let subscriber_id = subscription.id();

    loop {
        tokio::select! {
            biased;

            () = cancel_token.cancelled() => break,

            () = output.closed() => break,

            event = subscription.recv() => {
                let Some(event) = event else { break };
                if !forward(&output, event, &cancel_token).await {
                    break;
                }
            }
        }
    }

    debug!(
        target: "gk.grpc.admin",
        subscriber_id = subscriber_id,
        "Log stream closed"
    );
}

/// Hand one event to the caller. Returns `false` when the relay should
/// stop, including while waiting on a caller that is not reading.
async fn forward(
    output: &mpsc::Sender<Result<pb::Event, Status>>,
    event: Event,
    cancel_token: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;

        () = cancel_token.cancelled() => false,

        result = output.send(Ok(event.into())) => result.is_ok(),
    }
}

//! Per-subscriber statistics aggregator.
//!
//! Each `Statistics` stream owns one aggregator task. It drains its private
//! visit queue into a [`StatWindow`] and, every period, sends a snapshot
//! of the window to the caller and starts a new one. A window with no
//! visits still produces a snapshot.
//!
//! The task ends when:
//! - the server shuts down (no final partial snapshot is sent),
//! - the caller's stream goes away,
//! - the visit feed closes.

use super::broadcaster::Subscription;
use crate::errors::GatekeeperError;
use crate::models::{StatSnapshot, StatWindow, Visit};
use crate::observability::metrics;

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::{debug, info, instrument};

/// Validate a requested flush period.
///
/// # Errors
///
/// Returns `GatekeeperError::InvalidInterval` for a zero period.
pub fn stats_period(interval_seconds: u64) -> Result<Duration, GatekeeperError> {
    if interval_seconds == 0 {
        return Err(GatekeeperError::InvalidInterval(interval_seconds));
    }
    Ok(Duration::from_secs(interval_seconds))
}

/// Windowed counter over one visit subscription.
///
/// `M` is the message type delivered to the caller; production uses the
/// wire `Stat`.
pub struct StatsAggregator<M> {
    period: Duration,
    visits: Subscription<Visit>,
    output: mpsc::Sender<Result<M, Status>>,
    cancel_token: CancellationToken,
    ticker: Interval,
    window: StatWindow,
}

impl<M> StatsAggregator<M>
where
    M: From<StatSnapshot> + Send + 'static,
{
    /// Spawn the aggregator task.
    ///
    /// The first snapshot is sent one full `period` after this call.
    pub fn spawn(
        period: Duration,
        visits: Subscription<Visit>,
        output: mpsc::Sender<Result<M, Status>>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let aggregator = Self {
            period,
            visits,
            output,
            cancel_token,
            ticker,
            window: StatWindow::default(),
        };
        tokio::spawn(aggregator.run())
    }

    #[instrument(skip_all, name = "gk.actor.aggregator", fields(subscriber_id = self.visits.id()))]
    async fn run(mut self) {
        debug!(
            target: "gk.actor.aggregator",
            period_secs = self.period.as_secs(),
            "StatsAggregator started"
        );

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    debug!(target: "gk.actor.aggregator", "StatsAggregator cancelled");
                    break;
                }

                () = self.output.closed() => {
                    debug!(target: "gk.actor.aggregator", "Statistics stream closed by caller");
                    break;
                }

                _ = self.ticker.tick() => {
                    if !self.flush().await {
                        break;
                    }
                }

                visit = self.visits.recv() => {
                    match visit {
                        Some(visit) => self.window.record(&visit),
                        None => {
                            info!(target: "gk.actor.aggregator", "Visit feed closed, exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Send the current window and reset it. Returns `false` when the task
    /// should stop.
    ///
    /// Visits already queued when the tick fires belong to the closing window.
    async fn flush(&mut self) -> bool {
        while let Some(visit) = self.visits.try_recv() {
            self.window.record(&visit);
        }

        let snapshot = StatSnapshot {
            timestamp: chrono::Utc::now().timestamp(),
            window: self.window.take(),
        };

        tokio::select! {
            biased;

            () = self.cancel_token.cancelled() => false,

            result = self.output.send(Ok(M::from(snapshot))) => {
                if result.is_ok() {
                    metrics::record_stats_flush();
                    true
                } else {
                    false
                }
            }
        }
    }
}

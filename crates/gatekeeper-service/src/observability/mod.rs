//! Observability for the gatekeeper service.
//!
//! # Privacy by Default
//!
//! Request handlers log at `debug` with explicit fields only. Consumer names
//! are never used as metric labels; labels are bounded by code:
//! - `shape`: unary, streaming
//! - `outcome`: allowed, denied
//! - `reason`: `AccessDenial` variants (3 values)
//! - `feed`: events, visits
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `gk_calls_total` | Counter | `shape`, `outcome` | Intercepted calls |
//! | `gk_access_denied_total` | Counter | `reason` | Refused calls by reason |
//! | `gk_feed_messages_total` | Counter | `feed` | Messages fanned out |
//! | `gk_feed_subscribers` | Gauge | `feed` | Registered subscriber queues |
//! | `gk_feed_subscribers_removed_total` | Counter | `feed` | Disconnected subscribers pruned |
//! | `gk_stats_flushes_total` | Counter | none | Statistics snapshots delivered |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
pub use metrics::init_metrics_recorder;

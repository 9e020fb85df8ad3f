//! Gatekeeper Service Library
//!
//! An access-controlled gRPC service that:
//!
//! - Authorizes every call (unary and server-streaming) against a
//!   per-consumer ACL read from the `consumer` call metadata
//! - Broadcasts a record of every authorized call to any number of
//!   `Logging` subscribers
//! - Aggregates authorized calls into periodic per-method and per-consumer
//!   windows for `Statistics` subscribers
//!
//! # Architecture
//!
//! ```text
//! server::start
//! ├── Hub
//! │   ├── BroadcastActor<Event>   (one task, owns log subscribers)
//! │   └── BroadcastActor<Visit>   (one task, owns statistics subscribers)
//! └── tonic Server
//!     └── GatekeeperService (Biz + Admin)
//!         ├── CallInterceptor  (guard + record, before every handler)
//!         ├── BusinessMethods  (Add, Check, Test)
//!         └── AdminStreams     (Logging relay, StatsAggregator per stream)
//! ```
//!
//! Mutable state is owned by exactly one task and mutated only through
//! message passing; the ACL is immutable and shared read-only.
//!
//! # Modules
//!
//! - [`actors`] - Broadcast coordinators, hub and statistics aggregator
//! - [`auth`] - ACL parsing and the authorization guard
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types with gRPC status mapping
//! - [`grpc`] - Interceptors and the gRPC service implementation
//! - [`models`] - Event, Visit and statistics window types
//! - [`observability`] - Health endpoints and metrics
//! - [`server`] - Service lifecycle

pub mod actors;
pub mod auth;
pub mod config;
pub mod errors;
pub mod grpc;
pub mod models;
pub mod observability;
pub mod server;

//! gRPC surface of the gatekeeper.
//!
//! - `interceptor`: ACL check and audit emission around every call
//! - `business`: the `Biz` methods
//! - `admin`: the `Logging` and `Statistics` streams
//! - `service`: one type implementing both generated service traits

pub mod admin;
pub mod business;
pub mod interceptor;
pub mod service;

pub use admin::{AdminStreams, EventStream, StatStream};
pub use business::BusinessMethods;
pub use interceptor::{
    CallContext, CallInterceptor, CallShape, CONSUMER_METADATA_KEY, UNKNOWN_ORIGIN,
};
pub use service::GatekeeperService;

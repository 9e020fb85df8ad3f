//! Generated Protocol Buffer code for the Gatekeeper service.
//!
//! This crate contains the compiled `gatekeeper.proto` definitions: the
//! `Biz` and `Admin` services (server traits and clients) and their messages.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)] // Generated code has various doc formatting

// Re-export prost traits for convenience
pub use prost::Message;

pub mod gatekeeper {
    //! Biz + Admin services
    tonic::include_proto!("gatekeeper");
}

/// Fully-qualified gRPC method paths, as seen by the server.
pub mod methods {
    pub const BIZ_CHECK: &str = "/gatekeeper.Biz/Check";
    pub const BIZ_ADD: &str = "/gatekeeper.Biz/Add";
    pub const BIZ_TEST: &str = "/gatekeeper.Biz/Test";
    pub const ADMIN_LOGGING: &str = "/gatekeeper.Admin/Logging";
    pub const ADMIN_STATISTICS: &str = "/gatekeeper.Admin/Statistics";
}

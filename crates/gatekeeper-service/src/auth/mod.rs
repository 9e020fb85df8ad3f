//! Access control for inbound calls.
//!
//! - [`Acl`] - immutable consumer -> method pattern mapping, parsed once at startup
//! - [`AccessGuard`] - allow/deny decision shared by unary and streaming calls

pub mod acl;
pub mod guard;

pub use acl::{short_method_name, Acl, WILDCARD};
pub use guard::AccessGuard;

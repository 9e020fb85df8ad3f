//! Gatekeeper error types.
//!
//! Error types map to gRPC status codes for client responses.
//! Internal details are logged server-side but not exposed to clients.

use thiserror::Error;
use tonic::Status;

/// Gatekeeper error type.
///
/// Maps to gRPC status codes:
/// - `AccessDenied`: `UNAUTHENTICATED`
/// - `InvalidInterval`: `INVALID_ARGUMENT`
/// - `ShuttingDown`: `UNAVAILABLE`
/// - Config, `AclParse`, Bind, Transport, Internal: `INTERNAL`
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The ACL payload could not be parsed.
    #[error("Invalid ACL: {0}")]
    AclParse(String),

    /// Statistics interval must be a positive number of seconds.
    #[error("Invalid statistics interval: {0}s")]
    InvalidInterval(u64),

    /// Caller failed the authorization check.
    #[error("Access denied: {0}")]
    AccessDenied(AccessDenial),

    /// Listener could not be bound.
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    /// gRPC transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A feed coordinator is no longer running.
    #[error("Service is shutting down")]
    ShuttingDown,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reasons a call is refused by the authorization guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenial {
    /// No `consumer` metadata on the call.
    #[error("missing consumer identity")]
    MissingIdentity,

    /// Consumer is not present in the ACL.
    #[error("unknown consumer")]
    UnknownConsumer,

    /// Consumer is known but no pattern matches the method.
    #[error("method not permitted")]
    MethodNotPermitted,
}

impl AccessDenial {
    /// Returns the denial reason as a metric label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessDenial::MissingIdentity => "missing_identity",
            AccessDenial::UnknownConsumer => "unknown_consumer",
            AccessDenial::MethodNotPermitted => "method_not_permitted",
        }
    }
}

impl GatekeeperError {
    /// Returns a client-safe error message (no internal details).
    pub fn client_message(&self) -> String {
        match self {
            GatekeeperError::AccessDenied(_) => "Access denied".to_string(),
            GatekeeperError::InvalidInterval(_) => {
                "Statistics interval must be at least one second".to_string()
            }
            GatekeeperError::ShuttingDown => "Server is shutting down".to_string(),
            GatekeeperError::Config(_)
            | GatekeeperError::AclParse(_)
            | GatekeeperError::Bind { .. }
            | GatekeeperError::Transport(_)
            | GatekeeperError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    /// Converts the error into the gRPC status returned to the caller.
    pub fn grpc_status(&self) -> Status {
        let message = self.client_message();
        match self {
            GatekeeperError::AccessDenied(_) => Status::unauthenticated(message),
            GatekeeperError::InvalidInterval(_) => Status::invalid_argument(message),
            GatekeeperError::ShuttingDown => Status::unavailable(message),
            GatekeeperError::Config(_)
            | GatekeeperError::AclParse(_)
            | GatekeeperError::Bind { .. }
            | GatekeeperError::Transport(_)
            | GatekeeperError::Internal(_) => Status::internal(message),
        }
    }
}

impl From<AccessDenial> for GatekeeperError {
    fn from(denial: AccessDenial) -> Self {
        GatekeeperError::AccessDenied(denial)
    }
}

impl From<GatekeeperError> for Status {
    fn from(err: GatekeeperError) -> Self {
        err.grpc_status()
    }
}

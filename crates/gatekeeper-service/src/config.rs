//! Gatekeeper configuration.
//!
//! Configuration is loaded from environment variables. The ACL is carried as
//! raw JSON and parsed at startup by [`crate::server::start`], so a malformed
//! ACL aborts startup before anything is bound.

use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default gRPC bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:50061";

/// Default health endpoint bind address.
pub const DEFAULT_HEALTH_BIND_ADDRESS: &str = "0.0.0.0:8091";

/// Default mailbox size of each feed coordinator.
pub const DEFAULT_HUB_MAILBOX_CAPACITY: usize = 1024;

/// Default queue size of each subscription.
pub const DEFAULT_SUBSCRIBER_QUEUE_CAPACITY: usize = 64;

/// Gatekeeper configuration.
#[derive(Clone)]
pub struct Config {
    /// gRPC server bind address (default: "0.0.0.0:50061").
    pub bind_address: String,

    /// Health endpoint bind address (default: "0.0.0.0:8091").
    pub health_bind_address: String,

    /// ACL as a JSON object of consumer -> method patterns.
    pub acl_json: String,

    /// Mailbox size of each feed coordinator.
    pub hub_mailbox_capacity: usize,

    /// Queue size of each log or statistics subscription.
    pub subscriber_queue_capacity: usize,
}

/// The ACL can be large; Debug reports its size only.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("health_bind_address", &self.health_bind_address)
            .field("acl_json", &format_args!("<{} bytes>", self.acl_json.len()))
            .field("hub_mailbox_capacity", &self.hub_mailbox_capacity)
            .field("subscriber_queue_capacity", &self.subscriber_queue_capacity)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Build a configuration for an in-process service (tests, embedding).
    #[must_use]
    pub fn new(bind_address: impl Into<String>, acl_json: impl Into<String>) -> Self {
        Self {
            bind_address: bind_address.into(),
            health_bind_address: DEFAULT_HEALTH_BIND_ADDRESS.to_string(),
            acl_json: acl_json.into(),
            hub_mailbox_capacity: DEFAULT_HUB_MAILBOX_CAPACITY,
            subscriber_queue_capacity: DEFAULT_SUBSCRIBER_QUEUE_CAPACITY,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let acl_json = match (vars.get("GATEKEEPER_ACL"), vars.get("GATEKEEPER_ACL_FILE")) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                ConfigError::InvalidValue(format!("GATEKEEPER_ACL_FILE ({path}): {e}"))
            })?,
            (None, None) => {
                return Err(ConfigError::MissingEnvVar("GATEKEEPER_ACL".to_string()));
            }
        };

        let bind_address = vars
            .get("GATEKEEPER_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let health_bind_address = vars
            .get("GATEKEEPER_HEALTH_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HEALTH_BIND_ADDRESS.to_string());

        let hub_mailbox_capacity = parse_capacity(
            vars,
            "GATEKEEPER_HUB_MAILBOX_CAPACITY",
            DEFAULT_HUB_MAILBOX_CAPACITY,
        )?;

        let subscriber_queue_capacity = parse_capacity(
            vars,
            "GATEKEEPER_SUBSCRIBER_QUEUE_CAPACITY",
            DEFAULT_SUBSCRIBER_QUEUE_CAPACITY,
        )?;

        Ok(Config {
            bind_address,
            health_bind_address,
            acl_json,
            hub_mailbox_capacity,
            subscriber_queue_capacity,
        })
    }
}

/// Channel capacities must be positive; tokio panics on a zero-sized channel.
fn parse_capacity(
    vars: &HashMap<String, String>,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidValue(format!(
                "{key} must be a positive integer, got {raw:?}"
            ))),
        },
    }
}

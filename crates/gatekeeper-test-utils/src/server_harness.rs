//! Test server harness for end-to-end testing
//!
//! Provides `TestGatekeeperServer` for spawning real gatekeeper instances in tests.

use gatekeeper_service::config::Config;
use gatekeeper_service::grpc::CONSUMER_METADATA_KEY;
use gatekeeper_service::server::{self, RunningService};
use proto_gen::gatekeeper::admin_client::AdminClient;
use proto_gen::gatekeeper::biz_client::BizClient;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic::Request;

/// Test harness for spawning the gatekeeper in end-to-end tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_add_allowed() -> Result<()> {
///     let server = TestGatekeeperServer::spawn(r#"{"alice": ["Add"]}"#).await?;
///     let mut biz = server.biz_client().await?;
///
///     biz.add(with_consumer(Nothing::default(), "alice")).await?;
///     Ok(())
/// }
/// ```
pub struct TestGatekeeperServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    running: Option<RunningService>,
}

impl TestGatekeeperServer {
    /// Spawn a gatekeeper on a random local port with the given ACL.
    ///
    /// # Returns
    /// * `Ok(TestGatekeeperServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If the ACL is malformed or bind fails
    pub async fn spawn(acl_json: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with_config(Config::new("127.0.0.1:0", acl_json)).await
    }

    /// Spawn a gatekeeper from a full configuration.
    pub async fn spawn_with_config(config: Config) -> Result<Self, anyhow::Error> {
        let shutdown = CancellationToken::new();
        let running = server::start(&config, shutdown.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start test gatekeeper: {}", e))?;

        Ok(Self {
            addr: running.local_addr(),
            shutdown,
            running: Some(running),
        })
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Token that stops the server when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Connect a new `Biz` client.
    pub async fn biz_client(&self) -> Result<BizClient<Channel>, anyhow::Error> {
        BizClient::connect(self.url())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect Biz client: {}", e))
    }

    /// Connect a new `Admin` client.
    pub async fn admin_client(&self) -> Result<AdminClient<Channel>, anyhow::Error> {
        AdminClient::connect(self.url())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect Admin client: {}", e))
    }

    /// Cancel the server and wait for every task to finish.
    pub async fn shutdown(mut self) -> Result<(), anyhow::Error> {
        self.shutdown.cancel();
        if let Some(running) = self.running.take() {
            running
                .wait()
                .await
                .map_err(|e| anyhow::anyhow!("Gatekeeper stopped with error: {}", e))?;
        }
        Ok(())
    }
}

impl Drop for TestGatekeeperServer {
    fn drop(&mut self) {
        // Tasks observe the token and exit on their own
        self.shutdown.cancel();
    }
}

/// Wrap `message` in a request carrying `consumer` as the caller identity.
///
/// # Panics
///
/// Panics if `consumer` is not valid ASCII metadata.
pub fn with_consumer<T>(message: T, consumer: &str) -> Request<T> {
    let mut request = Request::new(message);
    request.metadata_mut().insert(
        CONSUMER_METADATA_KEY,
        consumer.parse().expect("consumer must be valid metadata"),
    );
    request
}

//! Service lifecycle.
//!
//! [`start`] brings the service up in a fixed order:
//!
//! 1. Parse the ACL. A malformed ACL fails here, before anything is bound.
//! 2. Bind the TCP listener. A bind failure leaves no tasks behind.
//! 3. Spawn the hub coordinators.
//! 4. Spawn the tonic server on the bound listener.
//!
//! Cancelling the token passed to [`start`] stops everything: the server
//! stops accepting, open streams end and the coordinators exit.
//! [`RunningService::wait`] joins all of it.

use crate::actors::Hub;
use crate::auth::{AccessGuard, Acl};
use crate::config::Config;
use crate::errors::GatekeeperError;
use crate::grpc::GatekeeperService;

use proto_gen::gatekeeper::admin_server::AdminServer;
use proto_gen::gatekeeper::biz_server::BizServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{error, info, instrument};

/// A started gatekeeper.
#[derive(Debug)]
pub struct RunningService {
    local_addr: SocketAddr,
    hub: Hub,
    server_task: JoinHandle<Result<(), GatekeeperError>>,
    hub_tasks: Vec<JoinHandle<()>>,
}

impl RunningService {
    /// Address the gRPC listener is bound to (resolves `:0`).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The hub shared by the request handlers.
    #[must_use]
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Wait for the server and the hub coordinators to finish.
    ///
    /// Returns once the shutdown token has been cancelled and every task
    /// has exited.
    ///
    /// # Errors
    ///
    /// `Transport` if the server failed, `Internal` if a task panicked.
    pub async fn wait(self) -> Result<(), GatekeeperError> {
        let served = self
            .server_task
            .await
            .map_err(|e| GatekeeperError::Internal(format!("gRPC server task failed: {e}")))?;

        for task in self.hub_tasks {
            task.await
                .map_err(|e| GatekeeperError::Internal(format!("Hub task failed: {e}")))?;
        }

        served
    }
}

/// Start the gatekeeper.
///
/// # Errors
///
/// - `AclParse` if the configured ACL is malformed (nothing is bound)
/// - `Bind` if the listener cannot be bound (no tasks are spawned)
#[instrument(skip_all, name = "gk.server.start", fields(bind_address = %config.bind_address))]
pub async fn start(
    config: &Config,
    shutdown: CancellationToken,
) -> Result<RunningService, GatekeeperError> {
    let acl = Acl::from_json(&config.acl_json).map_err(|e| {
        error!(target: "gk.server", error = %e, "Failed to parse ACL");
        e
    })?;
    info!(target: "gk.server", consumers = acl.len(), "ACL loaded");

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|e| bind_error(&config.bind_address, &e))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| bind_error(&config.bind_address, &e))?;

    let (hub, hub_tasks) = Hub::spawn(config.hub_mailbox_capacity, &shutdown);

    let service = Arc::new(GatekeeperService::new(
        AccessGuard::new(Arc::new(acl)),
        hub.clone(),
        config.subscriber_queue_capacity,
        shutdown.child_token(),
    ));

    let server_token = shutdown.child_token();
    let server = Server::builder()
        .add_service(BizServer::from_arc(Arc::clone(&service)))
        .add_service(AdminServer::from_arc(service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            server_token.cancelled().await;
            info!(target: "gk.server", "gRPC server shutting down");
        });

    let server_task = tokio::spawn(async move {
        server.await.map_err(|e| {
            error!(target: "gk.server", error = %e, "gRPC server failed");
            GatekeeperError::Transport(e.to_string())
        })
    });

    info!(target: "gk.server", addr = %local_addr, "gRPC server started");

    Ok(RunningService {
        local_addr,
        hub,
        server_task,
        hub_tasks,
    })
}

fn bind_error(addr: &str, e: &std::io::Error) -> GatekeeperError {
    error!(target: "gk.server", error = %e, addr = %addr, "Failed to bind gRPC listener");
    GatekeeperError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    }
}

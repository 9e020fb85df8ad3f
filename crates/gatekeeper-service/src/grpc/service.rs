//! The gatekeeper gRPC service.
//!
//! One value implements both generated traits, `Biz` and `Admin`, so a
//! single tonic server exposes the union of the two surfaces. Every method
//! is routed through the [`CallInterceptor`] with its full method path.

use super::admin::{AdminStreams, EventStream, StatStream};
use super::business::BusinessMethods;
use super::interceptor::CallInterceptor;
use crate::actors::Hub;
use crate::auth::AccessGuard;

use proto_gen::gatekeeper::admin_server::Admin;
use proto_gen::gatekeeper::biz_server::Biz;
use proto_gen::gatekeeper::{Nothing, StatInterval};
use proto_gen::methods;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

#[derive(Debug, Clone)]
pub struct GatekeeperService {
    interceptor: CallInterceptor,
    business: BusinessMethods,
    admin: AdminStreams,
}

impl GatekeeperService {
    /// # Arguments
    ///
    /// * `guard` - ACL decisions for every call
    /// * `hub` - Feeds that admitted calls are published to
    /// * `subscriber_capacity` - Queue size for each admin stream
    /// * `shutdown` - Ends all open admin streams when cancelled
    #[must_use]
    pub fn new(
        guard: AccessGuard,
        hub: Hub,
        subscriber_capacity: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            interceptor: CallInterceptor::new(guard, hub.clone()),
            business: BusinessMethods,
            admin: AdminStreams::new(hub, subscriber_capacity, shutdown),
        }
    }
}

#[tonic::async_trait]
impl Biz for GatekeeperService {
    async fn check(&self, request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        self.interceptor
            .unary(methods::BIZ_CHECK, request, |r| self.business.check(r))
            .await
    }

    async fn add(&self, request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        self.interceptor
            .unary(methods::BIZ_ADD, request, |r| self.business.add(r))
            .await
    }

    async fn test(&self, request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        self.interceptor
            .unary(methods::BIZ_TEST, request, |r| self.business.test(r))
            .await
    }
}

#[tonic::async_trait]
impl Admin for GatekeeperService {
    type LoggingStream = EventStream;
    type StatisticsStream = StatStream;

    async fn logging(
        &self,
        request: Request<Nothing>,
    ) -> Result<Response<Self::LoggingStream>, Status> {
        self.interceptor
            .streaming(methods::ADMIN_LOGGING, request, |r| self.admin.logging(r))
            .await
    }

    async fn statistics(
        &self,
        request: Request<StatInterval>,
    ) -> Result<Response<Self::StatisticsStream>, Status> {
        self.interceptor
            .streaming(methods::ADMIN_STATISTICS, request, |r| {
                self.admin.statistics(r)
            })
            .await
    }
}

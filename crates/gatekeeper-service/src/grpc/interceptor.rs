//! Per-call authorization and audit.
//!
//! Every RPC passes through [`CallInterceptor`] before its handler runs:
//!
//! 1. Read the `consumer` metadata entry and the peer address.
//! 2. Check the pair against the ACL. A missing identity or a refused
//!    method ends the call with `UNAUTHENTICATED` and the handler never runs.
//! 3. Publish an `Event` and a `Visit` to the hub.
//! 4. Run the handler and return its result untouched.
//!
//! A tonic `Interceptor` only sees `Request<()>` without the method path,
//! so the check is applied inside each generated trait method instead.

use crate::actors::Hub;
use crate::auth::AccessGuard;
use crate::errors::{AccessDenial, GatekeeperError};
use crate::models::{Event, Visit};
use crate::observability::metrics;

use std::future::Future;
use tonic::{Request, Response, Status};
use tracing::{debug, instrument, trace, warn};

/// Metadata key carrying the caller's identity.
pub const CONSUMER_METADATA_KEY: &str = "consumer";

/// Origin recorded when the transport exposes no peer address.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// RPC shape, used as a log field and metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    Unary,
    Streaming,
}

impl CallShape {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CallShape::Unary => "unary",
            CallShape::Streaming => "streaming",
        }
    }
}

/// Identity and origin of one call, taken from the request before it is
/// handed to the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub consumer: Option<String>,
    pub origin: String,
}

impl CallContext {
    /// Extract the context from request metadata and transport info.
    ///
    /// A non-ASCII `consumer` value counts as missing.
    pub fn from_request<T>(request: &Request<T>) -> Self {
        let consumer = request
            .metadata()
            .get(CONSUMER_METADATA_KEY)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let origin = request
            .remote_addr()
            .map_or_else(|| UNKNOWN_ORIGIN.to_string(), |addr| addr.to_string());

        Self { consumer, origin }
    }
}

/// Authorizes calls and records them on the hub.
#[derive(Debug, Clone)]
pub struct CallInterceptor {
    guard: AccessGuard,
    hub: Hub,
}

impl CallInterceptor {
    #[must_use]
    pub fn new(guard: AccessGuard, hub: Hub) -> Self {
        Self { guard, hub }
    }

    /// Admit a unary call, then run `handler` with the original request.
    ///
    /// # Errors
    ///
    /// `UNAUTHENTICATED` when the call is refused, `UNAVAILABLE` when the
    /// hub has stopped, otherwise whatever the handler returns.
    pub async fn unary<Req, Resp, F, Fut>(
        &self,
        method: &'static str,
        request: Request<Req>,
        handler: F,
    ) -> Result<Response<Resp>, Status>
    where
        F: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Result<Response<Resp>, Status>>,
    {
        let context = CallContext::from_request(&request);
        self.admit(&context, method, CallShape::Unary).await?;
        handler(request).await
    }

    /// Admit a server-streaming call once, at stream establishment.
    ///
    /// The stream returned by `handler` then governs the call's lifetime.
    ///
    /// # Errors
    ///
    /// Same as [`CallInterceptor::unary`].
    pub async fn streaming<Req, S, F, Fut>(
        &self,
        method: &'static str,
        request: Request<Req>,
        handler: F,
    ) -> Result<Response<S>, Status>
    where
        F: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Result<Response<S>, Status>>,
    {
        let context = CallContext::from_request(&request);
        self.admit(&context, method, CallShape::Streaming).await?;
        handler(request).await
    }

    /// Authorize the call and publish its audit records.
    ///
    /// Returns the admitted consumer.
    #[instrument(skip_all, name = "gk.grpc.interceptor", fields(method = method, shape = shape.as_str()))]
    async fn admit(
        &self,
        context: &CallContext,
        method: &'static str,
        shape: CallShape,
    ) -> Result<String, Status> {
        let consumer = context.consumer.as_deref();
        let admitted = self
            .guard
            .check(consumer, method)
            .and_then(|()| consumer.ok_or(AccessDenial::MissingIdentity));

        let consumer = match admitted {
            Ok(consumer) => consumer,
            Err(denial) => {
                debug!(
                    target: "gk.grpc.interceptor",
                    method = method,
                    reason = denial.as_str(),
                    origin = %context.origin,
                    "Call denied"
                );
                metrics::record_call(shape.as_str(), "denied");
                metrics::record_access_denied(denial.as_str());
                return Err(GatekeeperError::from(denial).into());
            }
        };

        metrics::record_call(shape.as_str(), "allowed");

        self.hub
            .record(
                Event::new(consumer, method, context.origin.as_str()),
                Visit::new(method, consumer),
            )
            .await
            .map_err(|e| {
                warn!(
                    target: "gk.grpc.interceptor",
                    method = method,
                    error = %e,
                    "Failed to publish call records"
                );
                Status::from(e)
            })?;

        trace!(
            target: "gk.grpc.interceptor",
            method = method,
            consumer = consumer,
            "Call admitted"
        );

        Ok(consumer.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::Acl;
    use proto_gen::gatekeeper::Nothing;
    use proto_gen::methods;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tonic::Code;

    fn interceptor(cancel_token: &CancellationToken) -> (CallInterceptor, Hub) {
        let acl = Acl::from_json(r#"{"alice": ["Add"], "ops": ["*"]}"#).unwrap();
        let (hub, _tasks) = Hub::spawn(16, cancel_token);
        (
            CallInterceptor::new(AccessGuard::new(Arc::new(acl)), hub.clone()),
            hub,
        )
    }

    fn request_from(consumer: Option<&str>) -> Request<Nothing> {
        let mut request = Request::new(Nothing::default());
        if let Some(consumer) = consumer {
            request
                .metadata_mut()
                .insert(CONSUMER_METADATA_KEY, consumer.parse().unwrap());
        }
        request
    }

    async fn ok_handler(_request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        Ok(Response::new(Nothing::default()))
    }

    #[test]
    fn test_context_without_transport_info() {
        let context = CallContext::from_request(&request_from(Some("alice")));
        assert_eq!(context.consumer.as_deref(), Some("alice"));
        assert_eq!(context.origin, UNKNOWN_ORIGIN);

        let context = CallContext::from_request(&request_from(None));
        assert!(context.consumer.is_none());
    }

    #[tokio::test]
    async fn test_allowed_call_emits_event_before_handler() {
        let cancel_token = CancellationToken::new();
        let (interceptor, hub) = interceptor(&cancel_token);
        let mut events = hub.subscribe_events(8).await.unwrap();
        let mut visits = hub.subscribe_visits(8).await.unwrap();

        interceptor
            .unary(methods::BIZ_ADD, request_from(Some("alice")), ok_handler)
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.consumer, "alice");
        assert_eq!(event.method, methods::BIZ_ADD);
        assert_eq!(event.origin, UNKNOWN_ORIGIN);

        let visit = tokio::time::timeout(Duration::from_secs(1), visits.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(visit, Visit::new(methods::BIZ_ADD, "alice"));

        cancel_token.cancel();
    }

    #[tokio::test]
    async fn test_denied_call_never_runs_handler() {
        let cancel_token = CancellationToken::new();
        let (interceptor, hub) = interceptor(&cancel_token);
        let ran = Arc::new(AtomicBool::new(false));

        for (consumer, method) in [
            (Some("alice"), methods::BIZ_CHECK),
            (Some("mallory"), methods::BIZ_ADD),
            (None, methods::BIZ_ADD),
        ] {
            let ran_clone = Arc::clone(&ran);
            let status = interceptor
                .unary(method, request_from(consumer), |_request| async move {
                    ran_clone.store(true, Ordering::SeqCst);
                    Ok::<_, Status>(Response::new(Nothing::default()))
                })
                .await
                .unwrap_err();

            assert_eq!(status.code(), Code::Unauthenticated);
            assert_eq!(status.message(), "Access denied");
        }

        assert!(!ran.load(Ordering::SeqCst), "handler must not run on denial");
        assert_eq!(hub.events().status().await.unwrap().published, 0);
        assert_eq!(hub.visits().status().await.unwrap().published, 0);

        cancel_token.cancel();
    }

    #[tokio::test]
    async fn test_streaming_admits_once() {
        let cancel_token = CancellationToken::new();
        let (interceptor, hub) = interceptor(&cancel_token);

        let response = interceptor
            .streaming(
                methods::ADMIN_LOGGING,
                request_from(Some("ops")),
                |_request| async { Ok::<_, Status>(Response::new(())) },
            )
            .await;
        assert!(response.is_ok());

        let denied = interceptor
            .streaming(
                methods::ADMIN_STATISTICS,
                request_from(Some("alice")),
                |_request| async { Ok::<_, Status>(Response::new(())) },
            )
            .await
            .unwrap_err();
        assert_eq!(denied.code(), Code::Unauthenticated);

        assert_eq!(hub.events().status().await.unwrap().published, 1);

        cancel_token.cancel();
    }

    #[tokio::test]
    async fn test_stopped_hub_rejects_call() {
        let cancel_token = CancellationToken::new();
        let (interceptor, hub) = interceptor(&cancel_token);
        let ran = Arc::new(AtomicBool::new(false));

        cancel_token.cancel();
        // Wait until the coordinator has actually gone away
        while hub.events().status().await.is_ok() {
            tokio::task::yield_now().await;
        }

        let ran_clone = Arc::clone(&ran);
        let status = interceptor
            .unary(methods::BIZ_ADD, request_from(Some("ops")), |_request| async move {
                ran_clone.store(true, Ordering::SeqCst);
                Ok::<_, Status>(Response::new(Nothing::default()))
            })
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::Unavailable);
        assert!(!ran.load(Ordering::SeqCst));
    }
}

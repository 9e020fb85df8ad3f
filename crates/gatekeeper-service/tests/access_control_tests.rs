//! End-to-end authorization tests against a real gatekeeper.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use gatekeeper_test_utils::{with_consumer, TestGatekeeperServer};
use proto_gen::gatekeeper::{Nothing, StatInterval};
use tonic::{Code, Request};

const ACL: &str = r#"{"alice": ["Add", "Check"], "ops": ["*"], "auditor": ["Logging"]}"#;

#[tokio::test]
async fn test_known_consumer_with_permitted_method() -> anyhow::Result<()> {
    let server = TestGatekeeperServer::spawn(ACL).await?;
    let mut biz = server.biz_client().await?;

    biz.add(with_consumer(Nothing::default(), "alice")).await?;
    biz.check(with_consumer(Nothing::default(), "alice")).await?;

    server.shutdown().await
}

#[tokio::test]
async fn test_method_outside_acl_rejected() -> anyhow::Result<()> {
    let server = TestGatekeeperServer::spawn(ACL).await?;
    let mut biz = server.biz_client().await?;

    let status = biz
        .test(with_consumer(Nothing::default(), "alice"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(status.message(), "Access denied");

    server.shutdown().await
}

#[tokio::test]
async fn test_unknown_consumer_rejected() -> anyhow::Result<()> {
    let server = TestGatekeeperServer::spawn(ACL).await?;
    let mut biz = server.biz_client().await?;

    let status = biz
        .add(with_consumer(Nothing::default(), "bob"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    server.shutdown().await
}

#[tokio::test]
async fn test_missing_identity_rejected() -> anyhow::Result<()> {
    let server = TestGatekeeperServer::spawn(ACL).await?;
    let mut biz = server.biz_client().await?;
    let mut admin = server.admin_client().await?;

    let status = biz.add(Request::new(Nothing::default())).await.unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let status = admin
        .logging(Request::new(Nothing::default()))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    server.shutdown().await
}

#[tokio::test]
async fn test_wildcard_grants_every_method() -> anyhow::Result<()> {
    let server = TestGatekeeperServer::spawn(ACL).await?;
    let mut biz = server.biz_client().await?;
    let mut admin = server.admin_client().await?;

    biz.add(with_consumer(Nothing::default(), "ops")).await?;
    biz.check(with_consumer(Nothing::default(), "ops")).await?;
    biz.test(with_consumer(Nothing::default(), "ops")).await?;
    admin
        .logging(with_consumer(Nothing::default(), "ops"))
        .await?;
    admin
        .statistics(with_consumer(
            StatInterval {
                interval_seconds: 1,
            },
            "ops",
        ))
        .await?;

    server.shutdown().await
}

#[tokio::test]
async fn test_streams_are_authorized() -> anyhow::Result<()> {
    let server = TestGatekeeperServer::spawn(ACL).await?;
    let mut admin = server.admin_client().await?;

    admin
        .logging(with_consumer(Nothing::default(), "auditor"))
        .await?;

    let status = admin
        .statistics(with_consumer(
            StatInterval {
                interval_seconds: 1,
            },
            "auditor",
        ))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let status = admin
        .logging(with_consumer(Nothing::default(), "alice"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    server.shutdown().await
}

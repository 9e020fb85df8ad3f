//! # Gatekeeper Test Utilities
//!
//! Shared test utilities for the gatekeeper service.
//!
//! This crate provides:
//! - Server test harness (`TestGatekeeperServer` for end-to-end tests)
//! - `with_consumer` for attaching an identity to a request
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gatekeeper_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestGatekeeperServer::spawn(r#"{"alice": ["Add"]}"#).await?;
//!     let mut biz = server.biz_client().await?;
//!
//!     biz.add(with_consumer(Nothing::default(), "alice")).await?;
//!     Ok(())
//! }
//! ```

pub mod server_harness;

// Re-export commonly used items
pub use server_harness::*;

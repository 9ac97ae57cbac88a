//! # DriftMQ Client Core
//!
//! An async Rust client core for the DriftMQ message broker, covering
//! per-message produce acknowledgement delivery and batched administrative
//! describe-configs requests.
//!
//! ## Features
//!
//! - **Response correlation**: every asynchronous broker response is routed
//!   back to the exact originating call, tolerating out-of-order, duplicate,
//!   and late frames
//! - **Delivery reports**: per-record continuations invoked exactly once with
//!   partition, offset, timestamp, and error, in broker-ack order
//! - **Batched admin calls**: one describe-configs request covering many
//!   resources, each with an independent outcome, results in request order
//! - **Bounded drain**: `flush` waits for outstanding calls up to a deadline;
//!   `close` drains, then cancels, and never leaves a continuation unresolved
//! - **Pluggable transport**: the core consumes decoded frames through the
//!   [`BrokerTransport`] trait and a completion feed, never raw bytes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use driftmq_client::*;
//! use std::sync::Arc;
//!
//! struct MyTransport;
//!
//! impl BrokerTransport for MyTransport {
//!     fn submit(
//!         &self,
//!         _id: CorrelationId,
//!         _request: RequestFrame,
//!     ) -> std::result::Result<(), SubmitError> {
//!         // encode and enqueue the frame here
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder()
//!         .brokers(vec!["localhost:9092"])
//!         .build()?;
//!
//!     let (_completions_tx, completions) = completion_channel();
//!     let client = DriftmqClient::new(config, Arc::new(MyTransport), completions);
//!
//!     let report = client
//!         .send(ProduceRecord::with_key("my-topic", "user-123", "Hello DriftMQ!"))
//!         .await?;
//!     println!(
//!         "Message sent to partition {:?} at offset {}",
//!         report.partition, report.offset
//!     );
//!
//!     let results = client
//!         .describe_configs(
//!             vec![ConfigResource::topic("my-topic")],
//!             DescribeConfigsOptions::new(),
//!         )
//!         .await?;
//!     println!("{} config entries", results[0].entries.len());
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod client;
mod completion;
pub mod config;
mod correlation;
pub mod error;
pub mod metrics;
pub mod producer;
pub mod protocol;
pub mod transport;

pub use admin::DescribeConfigsOptions;
pub use client::DriftmqClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{BrokerError, DriftmqClientError, ErrorCode};
pub use metrics::{global_metrics, ClientMetrics, MetricsSnapshot};
pub use protocol::*;
pub use transport::{
    completion_channel, BrokerTransport, Completion, CompletionFeed, CompletionSender, SubmitError,
};

/// Client library result type
pub type Result<T> = std::result::Result<T, DriftmqClientError>;

/// Client library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

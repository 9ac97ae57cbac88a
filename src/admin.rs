//! Batched describe-configs orchestration
//!
//! One call covers many resources with a single correlation id. Each resource
//! gets its own independent outcome; the call itself only fails for local
//! validation problems, submission failures, a call-level timeout, or
//! shutdown.

use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::client::DriftmqClient;
use crate::correlation::{DescribePending, PendingCall};
use crate::error::DriftmqClientError;
use crate::protocol::{
    ConfigResource, DescribeConfigsRequest, DescribeConfigsResult, RequestFrame,
};

/// Options for a describe-configs call
#[derive(Debug, Clone, Default)]
pub struct DescribeConfigsOptions {
    /// Call-level deadline; the client's request timeout when unset
    pub timeout: Option<Duration>,
}

impl DescribeConfigsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl DriftmqClient {
    /// Describe broker-side configuration for an ordered set of resources.
    ///
    /// Results come back in the order the resources were requested, no matter
    /// how the broker ordered its response. A resource can fail individually
    /// (its result carries the error) while siblings in the same call
    /// succeed. Invalid input (an empty list, an empty name, an unset type)
    /// fails here before anything reaches the transport.
    pub async fn describe_configs(
        &self,
        resources: Vec<ConfigResource>,
        options: DescribeConfigsOptions,
    ) -> Result<Vec<DescribeConfigsResult>, DriftmqClientError> {
        if self.is_closed() {
            return Err(DriftmqClientError::ClientClosed);
        }
        if resources.is_empty() {
            return Err(DriftmqClientError::admin(
                "describe_configs requires at least one resource",
            ));
        }
        if let Some(invalid) = resources.iter().find(|r| !r.is_valid()) {
            return Err(DriftmqClientError::invalid_resource(format!(
                "{} is not describable: a concrete type and a non-empty name are required",
                invalid
            )));
        }

        let timeout = options.timeout.unwrap_or(self.config.request_timeout);
        let (tx, mut rx) = oneshot::channel();
        let id = self.table.register(PendingCall::DescribeConfigs(DescribePending {
            resources: resources.clone(),
            reply: tx,
            submitted_at: Instant::now(),
        }));

        let frame = RequestFrame::DescribeConfigs(DescribeConfigsRequest {
            resources,
            timeout_ms: timeout.as_millis() as u32,
        });
        if let Err(err) = self.transport.submit(id, frame) {
            warn!(correlation_id = id, %err, "describe-configs submission rejected");
            // Deregister before surfacing; the reply channel is dropped with
            // the pending call.
            if self.table.resolve(id).is_some() {
                self.table.mark_resolved();
            }
            return Err(match err {
                crate::transport::SubmitError::QueueFull => DriftmqClientError::QueueFull,
                crate::transport::SubmitError::NotConnected => {
                    DriftmqClientError::transport(err.to_string())
                }
            });
        }
        self.metrics.record_describe_configs();
        debug!(correlation_id = id, "describe-configs request submitted");

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        tokio::select! {
            reply = &mut rx => match reply {
                Ok(result) => result,
                // The sender is dropped without a reply only if the pending
                // call vanished without resolution; treat as shutdown.
                Err(_) => Err(DriftmqClientError::ClientClosed),
            },
            _ = &mut deadline => {
                if self.table.resolve(id).is_some() {
                    self.table.mark_resolved();
                    self.metrics.record_describe_configs_timeout();
                    debug!(correlation_id = id, "describe-configs call timed out");
                    Err(DriftmqClientError::timeout(timeout.as_millis() as u64))
                } else {
                    // The response won the race against the deadline; it has
                    // already been sent into the reply channel.
                    match rx.await {
                        Ok(result) => result,
                        Err(_) => Err(DriftmqClientError::timeout(timeout.as_millis() as u64)),
                    }
                }
            }
        }
    }
}

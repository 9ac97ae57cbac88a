//! Produce dispatch: registration, submission, and delivery continuations

use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::client::DriftmqClient;
use crate::correlation::{PendingCall, ProducePending};
use crate::error::DriftmqClientError;
use crate::protocol::{now_unix_ms, DeliveryReport, ProduceRecord, ProduceRequest, RequestFrame};

impl DriftmqClient {
    /// Produce a record, delivering its report to `on_delivery` exactly once.
    ///
    /// Returns as soon as the record is handed to the transport; the
    /// continuation fires later on the completion task, in broker-ack order.
    /// A record the transport rejects (queue full, not connected) is resolved
    /// immediately with a local error code carried in the same report shape
    /// as a broker error. An unset partition lets the broker-side partitioner
    /// choose; an unset timestamp uses send time.
    pub fn produce<F>(&self, record: ProduceRecord, on_delivery: F)
    where
        F: FnOnce(DeliveryReport) + Send + Sync + 'static,
    {
        let create_time_ms = record.timestamp.unwrap_or_else(now_unix_ms);
        let pending = ProducePending {
            topic: record.topic.clone(),
            partition: record.partition,
            key: record.key.clone(),
            value: record.value.clone(),
            create_time_ms,
            callback: Box::new(on_delivery),
            submitted_at: Instant::now(),
        };

        if self.is_closed() {
            PendingCall::Produce(pending).fail(crate::error::ErrorCode::ClientClosed, "client closed");
            return;
        }

        let byte_count = record.value.len() + record.key.as_ref().map_or(0, |k| k.len());
        let frame = RequestFrame::Produce(ProduceRequest {
            topic: record.topic,
            partition: record.partition,
            key: record.key,
            value: record.value,
            timestamp_ms: create_time_ms,
            acks: self.config.acks,
            timeout_ms: self.config.request_timeout.as_millis() as u32,
        });

        let id = self.table.register(PendingCall::Produce(pending));
        match self.transport.submit(id, frame) {
            Ok(()) => {
                self.metrics.record_send(byte_count as u64);
                debug!(correlation_id = id, "produce request submitted");
                // close() may have cancelled everything between the closed
                // check and registration; make sure this entry cannot outlive
                // shutdown unresolved.
                if self.is_closed() {
                    if let Some(call) = self.table.resolve(id) {
                        call.fail(crate::error::ErrorCode::ClientClosed, "client closed");
                        self.table.mark_resolved();
                    }
                }
            }
            Err(err) => {
                self.metrics.record_send_error();
                warn!(correlation_id = id, %err, "produce submission rejected");
                if let Some(call) = self.table.resolve(id) {
                    call.fail(err.error_code(), &err.to_string());
                    self.table.mark_resolved();
                }
            }
        }
    }

    /// Produce a record and await its delivery report.
    ///
    /// The report is returned even when it carries a broker or local error;
    /// inspect `report.error`. Dropping the returned future abandons the wait
    /// only, the underlying call still resolves asynchronously.
    pub async fn send(&self, record: ProduceRecord) -> Result<DeliveryReport, DriftmqClientError> {
        let (tx, rx) = oneshot::channel();
        self.produce(record, move |report| {
            let _ = tx.send(report);
        });
        rx.await.map_err(|_| DriftmqClientError::ClientClosed)
    }
}

//! Completion processing: one task per client resolving broker responses
//!
//! All continuation invocations happen here, serialized, so two completions
//! never run concurrently with each other. Completions are delivered in the
//! order the broker acknowledged them, which may differ from submission
//! order; callers that need submission-order coupling must not rely on
//! cross-record completion ordering.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::correlation::{CorrelationTable, DescribePending, PendingCall, ProducePending};
use crate::error::{BrokerError, ErrorCode};
use crate::metrics::ClientMetrics;
use crate::protocol::{
    CorrelationId, DeliveryReport, DescribeConfigsResponse, DescribeConfigsResult, ProduceAck,
    ResourceType, ResponseFrame, Timestamp,
};
use crate::transport::CompletionFeed;

/// Drain the transport's completion feed until it closes.
///
/// Duplicate and late frames (no matching pending call) are logged and
/// dropped; the broker may retransmit acknowledgements and a continuation
/// must never be invoked twice.
pub(crate) async fn run_completion_loop(
    table: Arc<CorrelationTable>,
    mut feed: CompletionFeed,
    metrics: Arc<ClientMetrics>,
) {
    while let Some((id, frame)) = feed.recv().await {
        match table.resolve(id) {
            None => {
                debug!(correlation_id = id, "dropping duplicate or late frame");
                metrics.record_duplicate_ack();
            }
            Some(PendingCall::Produce(pending)) => {
                resolve_produce(id, pending, frame, &metrics);
                table.mark_resolved();
            }
            Some(PendingCall::DescribeConfigs(pending)) => {
                resolve_describe_configs(id, pending, frame);
                table.mark_resolved();
            }
        }
    }
    debug!("completion feed closed");
}

fn resolve_produce(
    id: CorrelationId,
    pending: ProducePending,
    frame: ResponseFrame,
    metrics: &ClientMetrics,
) {
    let ack = match frame {
        ResponseFrame::Produce(ack) => ack,
        other => {
            warn!(correlation_id = id, ?other, "response frame kind does not match pending call");
            PendingCall::Produce(pending).fail(
                ErrorCode::Unknown,
                "broker returned a mismatched response frame",
            );
            return;
        }
    };

    let latency = pending.submitted_at.elapsed();
    let (report, callback) = build_delivery_report(pending, ack);
    metrics.record_delivery(latency, report.error.is_error());
    debug!(
        correlation_id = id,
        topic = %report.topic,
        partition = ?report.partition,
        offset = report.offset,
        "delivery report ready"
    );
    callback(report);
}

fn build_delivery_report(
    pending: ProducePending,
    ack: ProduceAck,
) -> (DeliveryReport, crate::correlation::DeliveryCallback) {
    let error = BrokerError::from_wire(ack.error_code, ack.error_message);
    let (offset, timestamp) = if error.is_error() {
        (0, Timestamp::not_available())
    } else if ack.log_append_time_ms >= 0 {
        (ack.base_offset, Timestamp::log_append_time(ack.log_append_time_ms))
    } else {
        (ack.base_offset, Timestamp::create_time(pending.create_time_ms))
    };

    let report = DeliveryReport {
        topic: pending.topic,
        partition: Some(ack.partition),
        offset,
        timestamp,
        key: pending.key,
        value: pending.value,
        error,
    };
    (report, pending.callback)
}

fn resolve_describe_configs(id: CorrelationId, pending: DescribePending, frame: ResponseFrame) {
    let response = match frame {
        ResponseFrame::DescribeConfigs(response) => response,
        other => {
            warn!(correlation_id = id, ?other, "response frame kind does not match pending call");
            PendingCall::DescribeConfigs(pending).fail(
                ErrorCode::Unknown,
                "broker returned a mismatched response frame",
            );
            return;
        }
    };

    let latency = pending.submitted_at.elapsed();
    let results = reorder_results(&pending.resources, response);
    debug!(
        correlation_id = id,
        resources = results.len(),
        latency_us = latency.as_micros() as u64,
        "describe-configs response resolved"
    );
    // Send fails only when the caller abandoned the await.
    let _ = pending.reply.send(Ok(results));
}

/// Re-associate response blocks with the requested resources by (type, name)
/// and emit results in request order, independent of wire order. A resource
/// the broker did not answer for gets its own error block rather than
/// poisoning the whole call.
fn reorder_results(
    requested: &[crate::protocol::ConfigResource],
    response: DescribeConfigsResponse,
) -> Vec<DescribeConfigsResult> {
    let mut by_resource: HashMap<(ResourceType, String), crate::protocol::ResourceConfigs> =
        response
            .results
            .into_iter()
            .map(|block| ((block.resource_type, block.name.clone()), block))
            .collect();

    requested
        .iter()
        .map(|resource| {
            match by_resource.remove(&(resource.resource_type, resource.name.clone())) {
                Some(block) => DescribeConfigsResult {
                    resource: resource.clone(),
                    error: BrokerError::from_wire(block.error_code, block.error_message),
                    entries: block
                        .entries
                        .into_iter()
                        .map(|entry| (entry.key.clone(), entry))
                        .collect(),
                },
                None => DescribeConfigsResult {
                    resource: resource.clone(),
                    error: BrokerError::new(
                        ErrorCode::Unknown,
                        format!("broker returned no result for {}", resource),
                    ),
                    entries: HashMap::new(),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ConfigEntry, ConfigResource, ConfigSource, ResourceConfigs};
    use bytes::Bytes;
    use std::time::Instant;

    fn entry(key: &str, value: &str) -> ConfigEntry {
        ConfigEntry {
            key: key.to_string(),
            value: Some(value.to_string()),
            source: ConfigSource::Default,
            is_read_only: false,
            is_sensitive: false,
            is_synonym: false,
            synonyms: Vec::new(),
        }
    }

    fn block(resource: &ConfigResource, entries: Vec<ConfigEntry>) -> ResourceConfigs {
        ResourceConfigs {
            resource_type: resource.resource_type,
            name: resource.name.clone(),
            error_code: 0,
            error_message: None,
            entries,
        }
    }

    #[test]
    fn test_reorder_restores_request_order() {
        let a = ConfigResource::topic("alpha");
        let b = ConfigResource::topic("beta");
        let response = DescribeConfigsResponse {
            results: vec![
                block(&b, vec![entry("flush.ms", "1000")]),
                block(&a, vec![entry("compression.type", "producer")]),
            ],
        };

        let results = reorder_results(&[a.clone(), b.clone()], response);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].resource, a);
        assert_eq!(results[1].resource, b);
        assert!(results[0].entries.contains_key("compression.type"));
        assert!(results[1].entries.contains_key("flush.ms"));
    }

    #[test]
    fn test_missing_block_becomes_per_resource_error() {
        let a = ConfigResource::topic("alpha");
        let b = ConfigResource::topic("beta");
        let response = DescribeConfigsResponse {
            results: vec![block(&a, vec![entry("flush.ms", "1000")])],
        };

        let results = reorder_results(&[a, b], response);
        assert!(!results[0].error.is_error());
        assert!(results[1].error.is_error());
        assert!(results[1].entries.is_empty());
    }

    #[test]
    fn test_synonym_order_preserved() {
        let broker = ConfigResource::broker("0");
        let mut listener = entry("advertised.listeners", "PLAINTEXT://b:9092");
        listener.synonyms = vec![
            entry("advertised.listeners", "PLAINTEXT://b:9092"),
            entry("listeners", "PLAINTEXT://0.0.0.0:9092"),
        ];
        let response = DescribeConfigsResponse {
            results: vec![block(&broker, vec![listener])],
        };

        let results = reorder_results(&[broker], response);
        let synonyms = &results[0].entries["advertised.listeners"].synonyms;
        assert_eq!(synonyms[0].key, "advertised.listeners");
        assert_eq!(synonyms[1].key, "listeners");
    }

    #[test]
    fn test_error_report_has_no_offset_or_timestamp() {
        let pending = ProducePending {
            topic: "events".to_string(),
            partition: None,
            key: Some(Bytes::from("k")),
            value: Bytes::from("v"),
            create_time_ms: 123,
            callback: Box::new(|_| {}),
            submitted_at: Instant::now(),
        };
        let ack = ProduceAck {
            topic: "events".to_string(),
            partition: 0,
            base_offset: 42,
            log_append_time_ms: -1,
            error_code: 3,
            error_message: Some("unknown topic".to_string()),
        };

        let (report, _callback) = build_delivery_report(pending, ack);
        assert!(report.error.is_error());
        assert_eq!(report.offset, 0);
        assert_eq!(
            report.timestamp.source,
            crate::protocol::TimestampSource::NotAvailable
        );
    }

    #[test]
    fn test_success_report_uses_create_time_without_log_append() {
        let pending = ProducePending {
            topic: "events".to_string(),
            partition: None,
            key: None,
            value: Bytes::from("v"),
            create_time_ms: 123,
            callback: Box::new(|_| {}),
            submitted_at: Instant::now(),
        };
        let ack = ProduceAck {
            topic: "events".to_string(),
            partition: 1,
            base_offset: 42,
            log_append_time_ms: -1,
            error_code: 0,
            error_message: None,
        };

        let (report, _callback) = build_delivery_report(pending, ack);
        assert!(!report.error.is_error());
        assert_eq!(report.offset, 42);
        assert_eq!(report.timestamp.value, 123);
        assert_eq!(
            report.timestamp.source,
            crate::protocol::TimestampSource::CreateTime
        );
    }
}

//! Metrics collection for the DriftMQ client

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Client metrics collector
#[derive(Debug, Default)]
pub struct ClientMetrics {
    // Produce path
    pub records_sent: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub send_errors: AtomicU64,
    pub deliveries: AtomicU64,
    pub delivery_errors: AtomicU64,
    pub ack_latency_sum: AtomicU64,
    pub ack_latency_count: AtomicU64,

    // Completion path
    pub duplicate_acks_dropped: AtomicU64,

    // Admin path
    pub describe_configs_requests: AtomicU64,
    pub describe_configs_timeouts: AtomicU64,

    // Shutdown
    pub cancelled_at_close: AtomicU64,
}

impl ClientMetrics {
    /// Record a record handed to the transport
    pub fn record_send(&self, byte_count: u64) {
        self.records_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a submission the transport rejected
    pub fn record_send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a delivery report handed to a continuation
    pub fn record_delivery(&self, latency: Duration, is_error: bool) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.delivery_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.ack_latency_sum
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.ack_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a duplicate or late frame dropped by the completion path
    pub fn record_duplicate_ack(&self) {
        self.duplicate_acks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a describe-configs request handed to the transport
    pub fn record_describe_configs(&self) {
        self.describe_configs_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a describe-configs call that hit its deadline
    pub fn record_describe_configs_timeout(&self) {
        self.describe_configs_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record calls force-cancelled at shutdown
    pub fn record_cancelled(&self, count: u64) {
        self.cancelled_at_close.fetch_add(count, Ordering::Relaxed);
    }

    /// Average submit-to-acknowledgement latency in microseconds
    pub fn average_ack_latency_us(&self) -> f64 {
        let sum = self.ack_latency_sum.load(Ordering::Relaxed);
        let count = self.ack_latency_count.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }

    /// Get snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_sent: self.records_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_errors: self.delivery_errors.load(Ordering::Relaxed),
            average_ack_latency_us: self.average_ack_latency_us(),
            duplicate_acks_dropped: self.duplicate_acks_dropped.load(Ordering::Relaxed),
            describe_configs_requests: self.describe_configs_requests.load(Ordering::Relaxed),
            describe_configs_timeouts: self.describe_configs_timeouts.load(Ordering::Relaxed),
            cancelled_at_close: self.cancelled_at_close.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub records_sent: u64,
    pub bytes_sent: u64,
    pub send_errors: u64,
    pub deliveries: u64,
    pub delivery_errors: u64,
    pub average_ack_latency_us: f64,
    pub duplicate_acks_dropped: u64,
    pub describe_configs_requests: u64,
    pub describe_configs_timeouts: u64,
    pub cancelled_at_close: u64,
}

/// Global metrics instance
static GLOBAL_METRICS: once_cell::sync::Lazy<Arc<ClientMetrics>> =
    once_cell::sync::Lazy::new(|| Arc::new(ClientMetrics::default()));

/// Get the global metrics instance
pub fn global_metrics() -> Arc<ClientMetrics> {
    GLOBAL_METRICS.clone()
}

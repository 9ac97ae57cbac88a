//! Correlation table mapping in-flight request ids to pending calls
//!
//! The table is the single authority for "who gets this response". Entries are
//! inserted by caller tasks and removed by the completion task; removal is
//! atomic, so every pending call is handed out at most once no matter how many
//! duplicate or late frames arrive for its id.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::futures::Notified;
use tokio::sync::{oneshot, Notify};
use tracing::debug;

use crate::error::{BrokerError, DriftmqClientError, ErrorCode};
use crate::protocol::{
    ConfigResource, CorrelationId, DeliveryReport, DescribeConfigsResult, PartitionId, Timestamp,
    TopicName,
};

/// Continuation invoked exactly once with the outcome of a produce call.
///
/// `Sync` is required so pending calls can live in the shared table while the
/// completion task runs on another thread.
pub(crate) type DeliveryCallback = Box<dyn FnOnce(DeliveryReport) + Send + Sync>;

/// Context retained for an unacknowledged produce call.
///
/// Key and value are kept so the eventual delivery report can echo them back
/// to the handler.
pub(crate) struct ProducePending {
    pub topic: TopicName,
    pub partition: Option<PartitionId>,
    pub key: Option<Bytes>,
    pub value: Bytes,
    pub create_time_ms: i64,
    pub callback: DeliveryCallback,
    pub submitted_at: Instant,
}

/// Context retained for an unanswered describe-configs call.
///
/// The original resource list is kept so the response blocks can be emitted
/// in request order regardless of wire order.
pub(crate) struct DescribePending {
    pub resources: Vec<ConfigResource>,
    pub reply: oneshot::Sender<Result<Vec<DescribeConfigsResult>, DriftmqClientError>>,
    pub submitted_at: Instant,
}

/// A registered call awaiting its broker response
pub(crate) enum PendingCall {
    Produce(ProducePending),
    DescribeConfigs(DescribePending),
}

impl PendingCall {
    /// Resolve this call with a terminal error, through the same continuation
    /// path a broker response would use.
    pub(crate) fn fail(self, code: ErrorCode, message: &str) {
        match self {
            PendingCall::Produce(pending) => {
                let report = DeliveryReport {
                    topic: pending.topic,
                    partition: pending.partition,
                    offset: 0,
                    timestamp: Timestamp::not_available(),
                    key: pending.key,
                    value: pending.value,
                    error: BrokerError::new(code, message),
                };
                (pending.callback)(report);
            }
            PendingCall::DescribeConfigs(pending) => {
                let error = match code {
                    ErrorCode::ClientClosed => DriftmqClientError::ClientClosed,
                    ErrorCode::QueueFull => DriftmqClientError::QueueFull,
                    ErrorCode::Transport => DriftmqClientError::transport(message),
                    _ => DriftmqClientError::admin(message),
                };
                // Send fails only when the caller abandoned the await; the
                // call still counts as resolved.
                let _ = pending.reply.send(Err(error));
            }
        }
    }
}

/// Thread-safe registry of pending calls keyed by correlation id.
///
/// Ids are assigned from a monotonic counter and never reused for the
/// lifetime of the client. Registration happens on caller tasks, resolution
/// on the completion task; unrelated registrations never block a resolution.
pub(crate) struct CorrelationTable {
    entries: DashMap<CorrelationId, PendingCall>,
    next_id: AtomicI32,
    // Counts calls whose continuation has not finished yet. Decremented by
    // mark_resolved after the continuation runs, not when the entry is
    // removed, so flush cannot return while a callback is still executing.
    unresolved: AtomicUsize,
    shrunk: Notify,
}

impl CorrelationTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicI32::new(1),
            unresolved: AtomicUsize::new(0),
            shrunk: Notify::new(),
        }
    }

    /// Register a pending call and return its freshly assigned id
    pub(crate) fn register(&self, call: PendingCall) -> CorrelationId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.unresolved.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(id, call);
        id
    }

    /// Atomically take the pending call for `id`.
    ///
    /// Returns `None` when the id is unknown or already resolved; duplicate
    /// and late frames land here and are simply dropped by the caller. The
    /// call still counts as pending until `mark_resolved`, which the caller
    /// must invoke once its continuation (or error path) has finished.
    pub(crate) fn resolve(&self, id: CorrelationId) -> Option<PendingCall> {
        self.entries.remove(&id).map(|(_, call)| call)
    }

    /// Record that a call taken with `resolve` has fully completed, waking
    /// any drain waiters.
    pub(crate) fn mark_resolved(&self) {
        self.unresolved.fetch_sub(1, Ordering::SeqCst);
        self.shrunk.notify_waiters();
    }

    /// Number of calls still awaiting resolution
    pub(crate) fn pending_count(&self) -> usize {
        self.unresolved.load(Ordering::SeqCst)
    }

    /// Completes when the table has shrunk.
    ///
    /// Callers should pin the future and call `enable` before reading
    /// `pending_count`, so a resolution landing in between still wakes them.
    pub(crate) fn drained_signal(&self) -> Notified<'_> {
        self.shrunk.notified()
    }

    /// Resolve every outstanding call with a terminal error.
    ///
    /// Used on shutdown so no continuation is ever left unresolved. Returns
    /// the number of calls cancelled.
    pub(crate) fn cancel_all(&self, code: ErrorCode, message: &str) -> usize {
        let ids: Vec<CorrelationId> = self.entries.iter().map(|entry| *entry.key()).collect();
        let mut cancelled = 0;
        for id in ids {
            if let Some(call) = self.resolve(id) {
                debug!(correlation_id = id, "cancelling pending call");
                call.fail(code, message);
                self.mark_resolved();
                cancelled += 1;
            }
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn produce_pending(invocations: Arc<AtomicUsize>) -> PendingCall {
        PendingCall::Produce(ProducePending {
            topic: "events".to_string(),
            partition: None,
            key: None,
            value: Bytes::from("v"),
            create_time_ms: 0,
            callback: Box::new(move |_| {
                invocations.fetch_add(1, Ordering::SeqCst);
            }),
            submitted_at: Instant::now(),
        })
    }

    #[test]
    fn test_register_assigns_unique_ids() {
        let table = CorrelationTable::new();
        let invocations = Arc::new(AtomicUsize::new(0));
        let a = table.register(produce_pending(invocations.clone()));
        let b = table.register(produce_pending(invocations.clone()));
        assert_ne!(a, b);
        assert_eq!(table.pending_count(), 2);
    }

    #[test]
    fn test_resolve_is_exactly_once() {
        let table = CorrelationTable::new();
        let invocations = Arc::new(AtomicUsize::new(0));
        let id = table.register(produce_pending(invocations.clone()));

        let call = table.resolve(id).expect("registered call");
        assert!(table.resolve(id).is_none());
        assert!(table.resolve(9999).is_none());

        // still pending until the continuation has actually run
        assert_eq!(table.pending_count(), 1);
        call.fail(ErrorCode::ClientClosed, "client closed");
        table.mark_resolved();
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(table.pending_count(), 0);
    }

    #[test]
    fn test_cancel_all_invokes_every_continuation() {
        let table = CorrelationTable::new();
        let invocations = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            table.register(produce_pending(invocations.clone()));
        }

        let cancelled = table.cancel_all(ErrorCode::ClientClosed, "client closed");
        assert_eq!(cancelled, 5);
        assert_eq!(invocations.load(Ordering::SeqCst), 5);
        assert_eq!(table.pending_count(), 0);
    }

    #[test]
    fn test_cancelled_produce_report_carries_local_code() {
        let table = CorrelationTable::new();
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        table.register(PendingCall::Produce(ProducePending {
            topic: "events".to_string(),
            partition: Some(2),
            key: Some(Bytes::from("k")),
            value: Bytes::from("v"),
            create_time_ms: 0,
            callback: Box::new(move |report| {
                tx.send(report).ok();
            }),
            submitted_at: Instant::now(),
        }));

        table.cancel_all(ErrorCode::ClientClosed, "client closed");
        let report = rx.recv().expect("continuation not invoked");
        assert_eq!(report.error.code(), ErrorCode::ClientClosed);
        assert_eq!(report.partition, Some(2));
        assert_eq!(report.key, Some(Bytes::from("k")));
    }
}

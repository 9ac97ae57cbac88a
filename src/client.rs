//! Client core: construction, flush/drain, and shutdown

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::completion::run_completion_loop;
use crate::config::ClientConfig;
use crate::correlation::CorrelationTable;
use crate::error::ErrorCode;
use crate::metrics::ClientMetrics;
use crate::transport::{BrokerTransport, CompletionFeed};

/// Asynchronous client core for produce delivery and admin requests.
///
/// The client owns the correlation table and a single completion-processing
/// task; submissions run on the caller's task and never wait for a network
/// round trip. Share it across tasks with an [`Arc`].
pub struct DriftmqClient {
    pub(crate) config: ClientConfig,
    pub(crate) table: Arc<CorrelationTable>,
    pub(crate) transport: Arc<dyn BrokerTransport>,
    pub(crate) metrics: Arc<ClientMetrics>,
    closed: AtomicBool,
    completion_task: Mutex<Option<JoinHandle<()>>>,
}

impl DriftmqClient {
    /// Create a client over an established transport and its completion feed.
    ///
    /// Must be called from within a tokio runtime: the completion task is
    /// spawned here.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn BrokerTransport>,
        completions: CompletionFeed,
    ) -> Self {
        let table = Arc::new(CorrelationTable::new());
        let metrics = Arc::new(ClientMetrics::default());
        let completion_task = tokio::spawn(run_completion_loop(
            table.clone(),
            completions,
            metrics.clone(),
        ));

        info!(
            brokers = ?config.bootstrap_servers,
            client_id = ?config.client_id,
            "client created"
        );

        Self {
            config,
            table,
            transport,
            metrics,
            closed: AtomicBool::new(false),
            completion_task: Mutex::new(Some(completion_task)),
        }
    }

    /// Whether `close` has begun
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of calls still awaiting a broker response
    pub fn pending_count(&self) -> usize {
        self.table.pending_count()
    }

    /// Per-client metrics
    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    /// Wait until every pending call has resolved or the deadline elapses.
    ///
    /// Completion processing keeps running on its own task throughout.
    /// Returns the number of calls still pending when the wait ends; 0 means
    /// a clean drain. Nothing is cancelled here: at the deadline the
    /// remaining entries stay pending and may resolve later, or be
    /// force-cancelled at `close`.
    pub async fn flush(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            // Arm the drain waiter before reading the count, so a resolution
            // landing between the read and the await still wakes us.
            let drained = self.table.drained_signal();
            tokio::pin!(drained);
            drained.as_mut().enable();
            let pending = self.table.pending_count();
            if pending == 0 {
                return 0;
            }
            let now = Instant::now();
            if now >= deadline {
                debug!(pending, "flush deadline reached");
                return pending;
            }
            tokio::select! {
                _ = &mut drained => {}
                _ = tokio::time::sleep(deadline - now) => {
                    return self.table.pending_count();
                }
            }
        }
    }

    /// Drain, then cancel whatever remains, then stop completion processing.
    ///
    /// Idempotent. Every call still pending after the configured grace period
    /// is resolved with a client-closed error; no continuation is left
    /// unresolved on any exit path.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let remaining = self.flush(self.config.shutdown_grace).await;
        if remaining > 0 {
            warn!(remaining, "cancelling calls still pending at close");
        }
        let cancelled = self.table.cancel_all(ErrorCode::ClientClosed, "client closed");
        self.metrics.record_cancelled(cancelled as u64);

        if let Some(task) = self.completion_task.lock().take() {
            task.abort();
        }
        info!(cancelled, "client closed");
    }
}

impl Drop for DriftmqClient {
    fn drop(&mut self) {
        // Last-resort cleanup when close() was never awaited; continuations
        // still pending are resolved with the client-closed error.
        if !self.closed.swap(true, Ordering::SeqCst) {
            let cancelled = self.table.cancel_all(ErrorCode::ClientClosed, "client closed");
            if cancelled > 0 {
                warn!(cancelled, "client dropped without close; cancelled pending calls");
            }
            if let Some(task) = self.completion_task.lock().take() {
                task.abort();
            }
        }
    }
}

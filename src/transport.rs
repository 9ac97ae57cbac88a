//! Abstract broker transport consumed by the client core
//!
//! The core never touches raw bytes. It hands [`RequestFrame`]s tagged with a
//! correlation id to a [`BrokerTransport`] and receives decoded
//! [`ResponseFrame`]s back on a completion feed, in whatever order the broker
//! acknowledged them.

use tokio::sync::mpsc;

use crate::error::ErrorCode;
use crate::protocol::{CorrelationId, RequestFrame, ResponseFrame};

/// One decoded broker response paired with the id of the request it answers
pub type Completion = (CorrelationId, ResponseFrame);

/// Receiving half of the transport's completion feed, consumed by the client
pub type CompletionFeed = mpsc::UnboundedReceiver<Completion>;

/// Sending half of the completion feed, held by the transport
pub type CompletionSender = mpsc::UnboundedSender<Completion>;

/// Create a connected completion feed pair
pub fn completion_channel() -> (CompletionSender, CompletionFeed) {
    mpsc::unbounded_channel()
}

/// Why a submission was rejected before reaching the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The transport's outbound queue is full
    QueueFull,
    /// No broker connection is currently established
    NotConnected,
}

impl SubmitError {
    /// The local error code a rejected call is resolved with
    pub fn error_code(self) -> ErrorCode {
        match self {
            SubmitError::QueueFull => ErrorCode::QueueFull,
            SubmitError::NotConnected => ErrorCode::Transport,
        }
    }
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::QueueFull => write!(f, "transport queue full"),
            SubmitError::NotConnected => write!(f, "not connected to any broker"),
        }
    }
}

/// Request submission capability provided by the transport collaborator.
///
/// `submit` must not block on network I/O; it either enqueues the frame and
/// returns, or rejects it with a [`SubmitError`]. The response, if any,
/// arrives later on the completion feed under the same correlation id.
pub trait BrokerTransport: Send + Sync + 'static {
    fn submit(&self, correlation_id: CorrelationId, request: RequestFrame)
        -> Result<(), SubmitError>;
}

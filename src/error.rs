//! Error types for the DriftMQ client library

/// Main error type for DriftMQ client operations
#[derive(Debug, thiserror::Error)]
pub enum DriftmqClientError {
    /// Transport-related errors
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Protocol-related errors
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Admin client errors
    #[error("Admin error: {message}")]
    Admin { message: String },

    /// A config resource descriptor that cannot be sent to the broker
    #[error("Invalid config resource: {message}")]
    InvalidResource { message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Timeout errors
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Transport submission queue is full
    #[error("Transport queue full")]
    QueueFull,

    /// The client has been closed
    #[error("Client closed")]
    ClientClosed,
}

impl DriftmqClientError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a new admin error
    pub fn admin<S: Into<String>>(message: S) -> Self {
        Self::Admin {
            message: message.into(),
        }
    }

    /// Create a new invalid resource error
    pub fn invalid_resource<S: Into<String>>(message: S) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Create a new invalid config error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::QueueFull
        )
    }

    /// Check if this error was raised locally, before any broker interaction
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidResource { .. }
                | Self::InvalidConfig { .. }
                | Self::Admin { .. }
                | Self::QueueFull
                | Self::ClientClosed
        )
    }
}

/// Error codes carried in delivery reports and per-resource results.
///
/// Non-negative codes are reported by the broker. Negative codes are raised
/// locally by the client (failed submission, shutdown) but travel through the
/// same reporting path so callers have a single error-handling branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum ErrorCode {
    /// The client was closed while the call was still pending
    ClientClosed = -197,
    /// Local transport failure before the request reached the broker
    Transport = -195,
    /// The transport's submission queue was full
    QueueFull = -184,
    /// Unknown server error
    Unknown = -1,
    /// No error
    None = 0,
    /// Offset out of range
    OffsetOutOfRange = 1,
    /// Unknown topic or partition
    UnknownTopicOrPartition = 3,
    /// Leader not available
    LeaderNotAvailable = 5,
    /// Not leader for partition
    NotLeaderForPartition = 6,
    /// Request timed out on the broker
    RequestTimedOut = 7,
    /// Message exceeds the broker's size limit
    MessageTooLarge = 10,
    /// Topic name is malformed or reserved
    InvalidTopic = 17,
    /// Caller is not authorized for the topic
    TopicAuthorizationFailed = 29,
    /// The request was malformed
    InvalidRequest = 42,
    /// The group id does not exist
    GroupIdNotFound = 69,
}

impl ErrorCode {
    /// Numeric code as carried on the wire
    pub fn code(self) -> i16 {
        self as i16
    }

    /// True for every code except `None`
    pub fn is_error(self) -> bool {
        self != ErrorCode::None
    }

    /// True for codes raised locally by the client rather than the broker
    pub fn is_local(self) -> bool {
        self.code() < -1
    }
}

impl From<i16> for ErrorCode {
    fn from(code: i16) -> Self {
        match code {
            -197 => ErrorCode::ClientClosed,
            -195 => ErrorCode::Transport,
            -184 => ErrorCode::QueueFull,
            0 => ErrorCode::None,
            1 => ErrorCode::OffsetOutOfRange,
            3 => ErrorCode::UnknownTopicOrPartition,
            5 => ErrorCode::LeaderNotAvailable,
            6 => ErrorCode::NotLeaderForPartition,
            7 => ErrorCode::RequestTimedOut,
            10 => ErrorCode::MessageTooLarge,
            17 => ErrorCode::InvalidTopic,
            29 => ErrorCode::TopicAuthorizationFailed,
            42 => ErrorCode::InvalidRequest,
            69 => ErrorCode::GroupIdNotFound,
            _ => ErrorCode::Unknown,
        }
    }
}

/// An error field embedded in a report or a per-resource result.
///
/// `code == ErrorCode::None` means success; inspect with [`BrokerError::is_error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerError {
    code: ErrorCode,
    message: Option<String>,
}

impl BrokerError {
    /// A successful (non-error) value
    pub fn none() -> Self {
        Self {
            code: ErrorCode::None,
            message: None,
        }
    }

    /// Create an error with an explicit code and message
    pub fn new<S: Into<String>>(code: ErrorCode, message: S) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// Build from the decoded wire representation
    pub fn from_wire(code: i16, message: Option<String>) -> Self {
        Self {
            code: ErrorCode::from(code),
            message,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn is_error(&self) -> bool {
        self.code.is_error()
    }

    /// Human-readable reason, falling back to the code's name
    pub fn message(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => format!("{:?}", self.code),
        }
    }
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_roundtrip() {
        for code in [
            ErrorCode::None,
            ErrorCode::Unknown,
            ErrorCode::UnknownTopicOrPartition,
            ErrorCode::RequestTimedOut,
            ErrorCode::GroupIdNotFound,
            ErrorCode::ClientClosed,
        ] {
            assert_eq!(ErrorCode::from(code.code()), code);
        }
    }

    #[test]
    fn test_unmapped_code_is_unknown() {
        assert_eq!(ErrorCode::from(12345), ErrorCode::Unknown);
    }

    #[test]
    fn test_local_codes() {
        assert!(ErrorCode::ClientClosed.is_local());
        assert!(ErrorCode::QueueFull.is_local());
        assert!(!ErrorCode::RequestTimedOut.is_local());
        assert!(!ErrorCode::Unknown.is_local());
    }

    #[test]
    fn test_broker_error_predicates() {
        assert!(!BrokerError::none().is_error());
        let err = BrokerError::new(ErrorCode::UnknownTopicOrPartition, "no such topic");
        assert!(err.is_error());
        assert_eq!(err.message(), "no such topic");
    }

    #[test]
    fn test_client_error_predicates() {
        assert!(DriftmqClientError::timeout(100).is_timeout());
        assert!(DriftmqClientError::QueueFull.is_retryable());
        assert!(DriftmqClientError::invalid_resource("empty name").is_local());
        assert!(!DriftmqClientError::protocol("bad frame").is_local());
    }
}

//! Decoded protocol model shared between the client core and its transport
//!
//! The transport collaborator owns the wire bytes; everything here is already
//! decoded. Request frames are tagged with a correlation id at submission and
//! response frames come back paired with one on the completion feed.

use bytes::Bytes;
use std::collections::HashMap;
use std::time::SystemTime;

use crate::error::BrokerError;

pub type TopicName = String;
pub type PartitionId = u32;
pub type Offset = u64;
pub type CorrelationId = i32;

/// Milliseconds since the Unix epoch, used for record create times
pub(crate) fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

/// High-level record for producing messages
#[derive(Debug, Clone)]
pub struct ProduceRecord {
    pub topic: TopicName,
    pub partition: Option<PartitionId>, // None lets the broker-side partitioner choose
    pub key: Option<Bytes>,
    pub value: Bytes,
    pub timestamp: Option<i64>, // None means send time
}

impl ProduceRecord {
    /// Create a new record builder
    pub fn builder() -> ProduceRecordBuilder {
        ProduceRecordBuilder::new()
    }

    /// Create a simple record with topic and value
    pub fn new<T: Into<TopicName>, V: Into<Bytes>>(topic: T, value: V) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            key: None,
            value: value.into(),
            timestamp: None,
        }
    }

    /// Create a record with topic, key, and value
    pub fn with_key<T: Into<TopicName>, K: Into<Bytes>, V: Into<Bytes>>(
        topic: T,
        key: K,
        value: V,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            key: Some(key.into()),
            value: value.into(),
            timestamp: None,
        }
    }
}

/// Builder for ProduceRecord
#[derive(Debug, Default)]
pub struct ProduceRecordBuilder {
    topic: Option<TopicName>,
    partition: Option<PartitionId>,
    key: Option<Bytes>,
    value: Option<Bytes>,
    timestamp: Option<i64>,
}

impl ProduceRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic<T: Into<TopicName>>(mut self, topic: T) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn partition(mut self, partition: PartitionId) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn key<K: Into<Bytes>>(mut self, key: K) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn value<V: Into<Bytes>>(mut self, value: V) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> ProduceRecord {
        let topic = self.topic.expect("Topic is required");
        let value = self.value.expect("Value is required");

        ProduceRecord {
            topic,
            partition: self.partition,
            key: self.key,
            value,
            timestamp: self.timestamp,
        }
    }
}

/// Where a record timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    /// Assigned by the client at send time
    CreateTime,
    /// Assigned by the broker when the record was appended to the log
    LogAppendTime,
    /// No timestamp available (error reports)
    NotAvailable,
}

/// A record timestamp plus its provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub value: i64,
    pub source: TimestampSource,
}

impl Timestamp {
    pub fn create_time(value: i64) -> Self {
        Self {
            value,
            source: TimestampSource::CreateTime,
        }
    }

    pub fn log_append_time(value: i64) -> Self {
        Self {
            value,
            source: TimestampSource::LogAppendTime,
        }
    }

    pub fn not_available() -> Self {
        Self {
            value: -1,
            source: TimestampSource::NotAvailable,
        }
    }
}

/// Outcome of a single produce attempt.
///
/// Constructed once by the completion path and handed to exactly one
/// continuation; the original key and value are echoed back so delivery
/// handlers can correlate reports without captured state.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub topic: TopicName,
    /// `None` when the record failed locally before a partition was assigned
    pub partition: Option<PartitionId>,
    pub offset: Offset,
    pub timestamp: Timestamp,
    pub key: Option<Bytes>,
    pub value: Bytes,
    pub error: BrokerError,
}

/// Kind of broker-side entity a config resource addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Unknown,
    Any,
    Topic,
    Group,
    Broker,
}

/// An administrable broker-side entity, addressed by type and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigResource {
    pub resource_type: ResourceType,
    pub name: String,
}

impl ConfigResource {
    pub fn new<S: Into<String>>(resource_type: ResourceType, name: S) -> Self {
        Self {
            resource_type,
            name: name.into(),
        }
    }

    pub fn topic<S: Into<String>>(name: S) -> Self {
        Self::new(ResourceType::Topic, name)
    }

    pub fn group<S: Into<String>>(name: S) -> Self {
        Self::new(ResourceType::Group, name)
    }

    pub fn broker<S: Into<String>>(name: S) -> Self {
        Self::new(ResourceType::Broker, name)
    }

    /// A resource is describable only with a concrete type and a non-empty name
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
            && matches!(
                self.resource_type,
                ResourceType::Topic | ResourceType::Group | ResourceType::Broker
            )
    }
}

impl std::fmt::Display for ConfigResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}/{}", self.resource_type, self.name)
    }
}

/// Where a configuration value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Unknown,
    DynamicTopic,
    DynamicBroker,
    DynamicDefaultBroker,
    StaticBroker,
    Default,
}

/// One configuration key's value plus metadata.
///
/// `synonyms` lists the alternate sources that would apply if the primary
/// were unset, in precedence order (most specific first); that order is
/// significant and preserved as the broker returned it.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub key: String,
    pub value: Option<String>,
    pub source: ConfigSource,
    pub is_read_only: bool,
    pub is_sensitive: bool,
    pub is_synonym: bool,
    pub synonyms: Vec<ConfigEntry>,
}

/// Per-resource outcome of a describe-configs call.
///
/// Entries are keyed by config name; a failed resource carries its own error
/// without affecting sibling resources from the same batched call.
#[derive(Debug, Clone)]
pub struct DescribeConfigsResult {
    pub resource: ConfigResource,
    pub error: BrokerError,
    pub entries: HashMap<String, ConfigEntry>,
}

/// Produce request frame handed to the transport for encoding
#[derive(Debug, Clone)]
pub struct ProduceRequest {
    pub topic: TopicName,
    pub partition: Option<PartitionId>,
    pub key: Option<Bytes>,
    pub value: Bytes,
    pub timestamp_ms: i64,
    pub acks: i16,
    pub timeout_ms: u32,
}

/// Decoded broker acknowledgement for a single produced record
#[derive(Debug, Clone)]
pub struct ProduceAck {
    pub topic: TopicName,
    pub partition: PartitionId,
    pub base_offset: Offset,
    /// Broker-assigned append time, -1 when the topic uses create-time stamping
    pub log_append_time_ms: i64,
    pub error_code: i16,
    pub error_message: Option<String>,
}

/// Describe-configs request frame enumerating all resources of one batched call
#[derive(Debug, Clone)]
pub struct DescribeConfigsRequest {
    pub resources: Vec<ConfigResource>,
    pub timeout_ms: u32,
}

/// Decoded per-resource block of a describe-configs response.
///
/// Blocks may arrive in any order; they are re-associated with the requested
/// resources by (type, name).
#[derive(Debug, Clone)]
pub struct ResourceConfigs {
    pub resource_type: ResourceType,
    pub name: String,
    pub error_code: i16,
    pub error_message: Option<String>,
    pub entries: Vec<ConfigEntry>,
}

/// Decoded describe-configs response frame
#[derive(Debug, Clone)]
pub struct DescribeConfigsResponse {
    pub results: Vec<ResourceConfigs>,
}

/// Request frames the core submits to the transport
#[derive(Debug, Clone)]
pub enum RequestFrame {
    Produce(ProduceRequest),
    DescribeConfigs(DescribeConfigsRequest),
}

/// Response frames the transport yields on the completion feed
#[derive(Debug, Clone)]
pub enum ResponseFrame {
    Produce(ProduceAck),
    DescribeConfigs(DescribeConfigsResponse),
}

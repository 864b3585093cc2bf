//! Produce request batches and produce responses
//!
//! Requests are built as [`WireTopicBatch`] values, one per topic, each
//! holding one [`WirePartitionBatch`] per partition. Responses are decoded
//! once at the I/O boundary into the closed [`ProduceResponse`] structure.

use crate::MessageSet;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error codes
// ============================================================================

/// Broker error codes reported per partition in a produce response
///
/// Values match the Kafka protocol error codes. Codes outside the known set
/// decode to [`ErrorCode::Other`] and keep their raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i16", into = "i16")]
pub enum ErrorCode {
    /// The server experienced an unexpected error
    UnknownServerError,
    /// No error - success
    None,
    /// Record failed its CRC check or is otherwise corrupt
    CorruptMessage,
    /// This server does not host this topic-partition
    UnknownTopicOrPartition,
    /// No leader for this topic-partition, election in progress
    LeaderNotAvailable,
    /// This broker is not the leader for the partition
    NotLeaderForPartition,
    /// The request timed out
    RequestTimedOut,
    /// The request included a message larger than the broker accepts
    MessageTooLarge,
    /// Batch larger than the configured segment size
    RecordListTooLarge,
    /// Fewer in-sync replicas than required; nothing was written
    NotEnoughReplicas,
    /// Written to the leader log, but with fewer in-sync replicas than required
    NotEnoughReplicasAfterAppend,
    /// Invalid value for required acks
    InvalidRequiredAcks,
    /// Not authorized to write to this topic
    TopicAuthorizationFailed,
    /// Any code this client does not model
    Other(i16),
}

/// What the producer does with messages that received an error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Delivered; nothing to do
    Complete,
    /// No replica persisted the write; resend to the (new) leader
    Retry,
    /// Give up on this send; report and drop
    Terminal,
}

impl ErrorCode {
    /// Raw protocol value
    pub fn code(&self) -> i16 {
        match self {
            Self::UnknownServerError => -1,
            Self::None => 0,
            Self::CorruptMessage => 2,
            Self::UnknownTopicOrPartition => 3,
            Self::LeaderNotAvailable => 5,
            Self::NotLeaderForPartition => 6,
            Self::RequestTimedOut => 7,
            Self::MessageTooLarge => 10,
            Self::RecordListTooLarge => 18,
            Self::NotEnoughReplicas => 19,
            Self::NotEnoughReplicasAfterAppend => 20,
            Self::InvalidRequiredAcks => 21,
            Self::TopicAuthorizationFailed => 29,
            Self::Other(code) => *code,
        }
    }

    /// Decode a raw protocol value
    pub fn from_code(code: i16) -> Self {
        match code {
            -1 => Self::UnknownServerError,
            0 => Self::None,
            2 => Self::CorruptMessage,
            3 => Self::UnknownTopicOrPartition,
            5 => Self::LeaderNotAvailable,
            6 => Self::NotLeaderForPartition,
            7 => Self::RequestTimedOut,
            10 => Self::MessageTooLarge,
            18 => Self::RecordListTooLarge,
            19 => Self::NotEnoughReplicas,
            20 => Self::NotEnoughReplicasAfterAppend,
            21 => Self::InvalidRequiredAcks,
            29 => Self::TopicAuthorizationFailed,
            other => Self::Other(other),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Fixed produce retry policy
    ///
    /// Only the three codes that guarantee no replica persisted the write are
    /// retried. `RequestTimedOut` and `NotEnoughReplicasAfterAppend` may have
    /// been written and would duplicate on resend.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::None => RetryPolicy::Complete,
            Self::LeaderNotAvailable | Self::NotLeaderForPartition | Self::NotEnoughReplicas => {
                RetryPolicy::Retry
            }
            _ => RetryPolicy::Terminal,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_policy() == RetryPolicy::Retry
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UnknownServerError => "UNKNOWN_SERVER_ERROR",
            Self::None => "NONE",
            Self::CorruptMessage => "CORRUPT_MESSAGE",
            Self::UnknownTopicOrPartition => "UNKNOWN_TOPIC_OR_PARTITION",
            Self::LeaderNotAvailable => "LEADER_NOT_AVAILABLE",
            Self::NotLeaderForPartition => "NOT_LEADER_FOR_PARTITION",
            Self::RequestTimedOut => "REQUEST_TIMED_OUT",
            Self::MessageTooLarge => "MESSAGE_TOO_LARGE",
            Self::RecordListTooLarge => "RECORD_LIST_TOO_LARGE",
            Self::NotEnoughReplicas => "NOT_ENOUGH_REPLICAS",
            Self::NotEnoughReplicasAfterAppend => "NOT_ENOUGH_REPLICAS_AFTER_APPEND",
            Self::InvalidRequiredAcks => "INVALID_REQUIRED_ACKS",
            Self::TopicAuthorizationFailed => "TOPIC_AUTHORIZATION_FAILED",
            Self::Other(_) => "OTHER",
        }
    }
}

impl From<i16> for ErrorCode {
    fn from(code: i16) -> Self {
        Self::from_code(code)
    }
}

impl From<ErrorCode> for i16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

// ============================================================================
// Request batches
// ============================================================================

/// Records for one partition of a produce request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePartitionBatch {
    pub partition: u32,
    pub message_set: MessageSet,
}

impl WirePartitionBatch {
    pub fn new(partition: u32, message_set: MessageSet) -> Self {
        Self {
            partition,
            message_set,
        }
    }
}

/// Records for one topic of a produce request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTopicBatch {
    pub topic: String,
    pub partitions: Vec<WirePartitionBatch>,
}

impl WireTopicBatch {
    pub fn new(topic: impl Into<String>, partitions: Vec<WirePartitionBatch>) -> Self {
        Self {
            topic: topic.into(),
            partitions,
        }
    }

    /// Find the batch for a partition
    pub fn partition(&self, partition: u32) -> Option<&WirePartitionBatch> {
        self.partitions.iter().find(|p| p.partition == partition)
    }
}

// ============================================================================
// Produce response
// ============================================================================

/// Outcome for one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionResponse {
    pub partition: u32,
    pub error_code: ErrorCode,
    /// Offset assigned to the first record, when the write succeeded
    pub base_offset: Option<i64>,
}

/// Outcomes for one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicResponse {
    pub topic: String,
    pub partitions: Vec<PartitionResponse>,
}

/// Broker reply to a produce request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProduceResponse {
    pub topics: Vec<TopicResponse>,
}

impl ProduceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a partition outcome, grouping under an existing topic entry
    pub fn with_partition(
        mut self,
        topic: impl Into<String>,
        partition: u32,
        error_code: ErrorCode,
    ) -> Self {
        self.push(
            topic,
            PartitionResponse {
                partition,
                error_code,
                base_offset: None,
            },
        );
        self
    }

    /// Append a successful partition outcome with its base offset
    pub fn with_offset(
        mut self,
        topic: impl Into<String>,
        partition: u32,
        base_offset: i64,
    ) -> Self {
        self.push(
            topic,
            PartitionResponse {
                partition,
                error_code: ErrorCode::None,
                base_offset: Some(base_offset),
            },
        );
        self
    }

    fn push(&mut self, topic: impl Into<String>, response: PartitionResponse) {
        let topic = topic.into();
        match self.topics.iter_mut().find(|t| t.topic == topic) {
            Some(entry) => entry.partitions.push(response),
            None => self.topics.push(TopicResponse {
                topic,
                partitions: vec![response],
            }),
        }
    }

    /// Iterate `(topic, partition outcome)` in response order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PartitionResponse)> {
        self.topics
            .iter()
            .flat_map(|t| t.partitions.iter().map(move |p| (t.topic.as_str(), p)))
    }

    /// True when every partition reported [`ErrorCode::None`]
    pub fn is_success(&self) -> bool {
        self.entries().all(|(_, p)| !p.error_code.is_error())
    }
}

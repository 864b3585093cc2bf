//! Application messages handed to the producer

use bytes::Bytes;
use rivven_protocol::Record;

/// A message to be produced
///
/// The target partition is assigned by the caller's partitioner and passed
/// alongside the message when it is added to a
/// [`MessageGroup`](crate::MessageGroup). Messages are tracked by position,
/// so two messages with identical bytes stay distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerMessage {
    /// Topic name
    pub topic: String,
    /// Optional key for partitioning
    pub key: Option<Bytes>,
    /// Message value
    pub value: Bytes,
    /// Timestamp in milliseconds since epoch
    pub timestamp: Option<i64>,
    /// Record headers
    pub headers: Vec<(String, Vec<u8>)>,
}

impl ProducerMessage {
    /// Create a keyless message
    pub fn new(topic: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            value: value.into(),
            timestamp: None,
            headers: Vec::new(),
        }
    }

    /// Create a keyed message
    pub fn with_key(
        topic: impl Into<String>,
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(topic, value)
        }
    }

    /// Set the timestamp
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Size of key + value + headers
    pub fn size(&self) -> usize {
        let key_size = self.key.as_ref().map(|k| k.len()).unwrap_or(0);
        let header_size: usize = self.headers.iter().map(|(k, v)| k.len() + v.len()).sum();
        key_size + self.value.len() + header_size
    }

    /// Wire record for this message (uncompressed)
    pub fn to_record(&self) -> Record {
        Record {
            key: self.key.clone(),
            value: self.value.clone(),
            timestamp: self.timestamp,
            headers: self.headers.clone(),
            attributes: 0,
        }
    }
}

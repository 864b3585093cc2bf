//! Records and message sets carried by produce requests

use crate::{ProtocolError, Result, MAX_MESSAGE_SIZE};
use bytes::Bytes;
use rivven_core::{CompressionAlgorithm, Compressor};
use serde::{Deserialize, Serialize};

/// Low bits of [`Record::attributes`] holding the compression codec id
const COMPRESSION_CODEC_MASK: i8 = 0x07;

/// A single record on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Optional record key
    pub key: Option<Bytes>,
    /// Record value/payload
    pub value: Bytes,
    /// Timestamp in milliseconds since epoch
    pub timestamp: Option<i64>,
    /// Record headers (key-value metadata)
    pub headers: Vec<(String, Vec<u8>)>,
    /// Kafka-style attributes; bits 0-2 carry the compression codec
    pub attributes: i8,
}

impl Record {
    /// Create an uncompressed record
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            key: None,
            value: value.into(),
            timestamp: None,
            headers: Vec::new(),
            attributes: 0,
        }
    }

    /// Set the key
    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Codec this record's value is compressed with, if any
    pub fn compression(&self) -> Option<CompressionAlgorithm> {
        CompressionAlgorithm::from_kafka_type_id(self.attributes & COMPRESSION_CODEC_MASK)
            .ok()
            .filter(|algo| algo.is_compressed())
    }

    /// Size of key + value + headers
    pub fn size(&self) -> usize {
        let key_size = self.key.as_ref().map(|k| k.len()).unwrap_or(0);
        let header_size: usize = self.headers.iter().map(|(k, v)| k.len() + v.len()).sum();
        key_size + self.value.len() + header_size
    }
}

/// Ordered batch of records for one partition
///
/// A compressed set holds exactly one wrapper record whose value is the
/// compressed encoding of the original set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSet {
    records: Vec<Record>,
}

impl MessageSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total payload size of all records
    pub fn size(&self) -> usize {
        self.records.iter().map(Record::size).sum()
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge(data.len(), MAX_MESSAGE_SIZE));
        }
        postcard::from_bytes(data).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }

    /// Wrap this set into a single compressed record
    ///
    /// [`CompressionAlgorithm::None`] returns an unchanged copy.
    pub fn compress(
        &self,
        algorithm: CompressionAlgorithm,
        compressor: &Compressor,
    ) -> Result<MessageSet> {
        if !algorithm.is_compressed() {
            return Ok(self.clone());
        }

        let encoded = self.to_bytes()?;
        let value = compressor.compress(&encoded, algorithm)?;
        let wrapper = Record {
            key: None,
            value,
            timestamp: self.records.iter().filter_map(|r| r.timestamp).max(),
            headers: Vec::new(),
            attributes: algorithm.kafka_type_id(),
        };

        Ok(MessageSet::new(vec![wrapper]))
    }

    /// Codec of the wrapper record, if this set is compressed
    pub fn compression(&self) -> Option<CompressionAlgorithm> {
        match self.records.as_slice() {
            [wrapper] => wrapper.compression(),
            _ => None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.compression().is_some()
    }

    /// Unwrap a compressed set back into its records
    pub fn decompress(&self, compressor: &Compressor) -> Result<MessageSet> {
        match (self.compression(), self.records.as_slice()) {
            (Some(algorithm), [wrapper]) => {
                let raw = compressor.decompress(&wrapper.value, algorithm)?;
                Self::from_bytes(&raw)
            }
            _ => Ok(self.clone()),
        }
    }
}

impl From<Vec<Record>> for MessageSet {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> MessageSet {
        MessageSet::new(vec![
            Record::new(b"first".to_vec())
                .with_key(b"k1".to_vec())
                .with_timestamp(10),
            Record::new(b"second".to_vec()).with_timestamp(30),
            Record::new(b"third".to_vec())
                .with_timestamp(20)
                .with_header("trace", b"abc".to_vec()),
        ])
    }

    #[test]
    fn test_record_size() {
        let record = Record::new(b"hello".to_vec())
            .with_key(b"key1".to_vec())
            .with_header("h", b"vv".to_vec());

        assert_eq!(record.size(), 4 + 5 + 3);
        assert_eq!(record.compression(), None);
    }

    #[test]
    fn test_compress_wraps_into_single_record() {
        let set = sample_set();
        let compressed = set
            .compress(CompressionAlgorithm::Zstd, &Compressor::new())
            .unwrap();

        assert_eq!(compressed.len(), 1);
        assert!(compressed.is_compressed());
        assert_eq!(compressed.compression(), Some(CompressionAlgorithm::Zstd));
        assert_eq!(compressed.records()[0].attributes, 4);
        assert_eq!(compressed.records()[0].timestamp, Some(30));

        let restored = compressed.decompress(&Compressor::new()).unwrap();
        assert_eq!(restored, set);
    }

    #[test]
    fn test_compress_with_none_is_noop() {
        let set = sample_set();
        let out = set
            .compress(CompressionAlgorithm::None, &Compressor::new())
            .unwrap();

        assert_eq!(out, set);
        assert!(!out.is_compressed());
    }

    #[test]
    fn test_decompress_uncompressed_set_is_identity() {
        let set = MessageSet::new(vec![Record::new(b"only".to_vec())]);
        assert!(!set.is_compressed());
        assert_eq!(set.decompress(&Compressor::new()).unwrap(), set);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let result = MessageSet::from_bytes(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(ProtocolError::Deserialization(_))));
    }
}

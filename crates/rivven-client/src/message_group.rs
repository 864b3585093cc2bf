//! Messages bound for a single broker
//!
//! A [`MessageGroup`] is created for one broker at the start of a send
//! attempt. Every [`add`](MessageGroup::add) appends to the group's ordered
//! log and, in the same call, records the message's position in a
//! topic → partition index. The log is the source of truth; the index only
//! ever holds positions into it, in insertion order.
//!
//! ```rust,ignore
//! use rivven_client::{CompressionConfig, MessageGroup, ProducerMessage};
//!
//! let mut group = MessageGroup::new("broker-1");
//! group.add(ProducerMessage::new("orders", "a"), 0);
//! group.add(ProducerMessage::new("orders", "b"), 1);
//!
//! let batches = group.build_wire_batches(&CompressionConfig::default())?;
//! // hand `batches` to the I/O layer, then:
//! let report = group.classify(&response);
//! for msg in report.retry() { /* re-enqueue */ }
//! ```

use crate::{CompressionResolver, ProducerMessage, Result};
use rivven_core::Compressor;
use rivven_protocol::{MessageSet, WirePartitionBatch, WireTopicBatch};
use std::collections::HashMap;
use tracing::debug;

/// Positions of the messages for one partition
#[derive(Debug, Clone)]
pub(crate) struct PartitionBucket {
    pub(crate) partition: u32,
    pub(crate) positions: Vec<usize>,
}

/// Partition buckets for one topic, in first-seen order
#[derive(Debug, Clone)]
pub(crate) struct TopicBucket {
    pub(crate) topic: String,
    pub(crate) partitions: Vec<PartitionBucket>,
    partition_index: HashMap<u32, usize>,
}

impl TopicBucket {
    fn new(topic: String) -> Self {
        Self {
            topic,
            partitions: Vec::new(),
            partition_index: HashMap::new(),
        }
    }

    fn push(&mut self, partition: u32, position: usize) {
        let slot = match self.partition_index.get(&partition) {
            Some(&slot) => slot,
            None => {
                self.partitions.push(PartitionBucket {
                    partition,
                    positions: Vec::new(),
                });
                let slot = self.partitions.len() - 1;
                self.partition_index.insert(partition, slot);
                slot
            }
        };
        self.partitions[slot].positions.push(position);
    }

    fn positions(&self, partition: u32) -> Option<&[usize]> {
        self.partition_index
            .get(&partition)
            .map(|&slot| self.partitions[slot].positions.as_slice())
    }
}

/// Messages assigned to one broker for one send attempt
#[derive(Debug, Clone)]
pub struct MessageGroup {
    broker_id: String,
    /// All messages in add order
    pub(crate) messages: Vec<ProducerMessage>,
    /// topic → partition → positions into `messages`
    pub(crate) topics: Vec<TopicBucket>,
    topic_index: HashMap<String, usize>,
}

impl MessageGroup {
    /// Create an empty group for `broker_id`
    ///
    /// The broker id is carried for diagnostics only.
    pub fn new(broker_id: impl Into<String>) -> Self {
        Self {
            broker_id: broker_id.into(),
            messages: Vec::new(),
            topics: Vec::new(),
            topic_index: HashMap::new(),
        }
    }

    /// Add a message assigned to `partition`
    ///
    /// The partition is trusted as given; range checks belong to the
    /// partitioner.
    pub fn add(&mut self, message: ProducerMessage, partition: u32) {
        let position = self.messages.len();

        let slot = match self.topic_index.get(message.topic.as_str()) {
            Some(&slot) => slot,
            None => {
                self.topics.push(TopicBucket::new(message.topic.clone()));
                let slot = self.topics.len() - 1;
                self.topic_index.insert(message.topic.clone(), slot);
                slot
            }
        };
        self.topics[slot].push(partition, position);
        self.messages.push(message);
    }

    pub fn broker_id(&self) -> &str {
        &self.broker_id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages in add order
    pub fn messages(&self) -> &[ProducerMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ProducerMessage> {
        self.messages
    }

    /// Topics in first-seen order
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|t| t.topic.as_str())
    }

    /// Partitions of `topic` in first-seen order
    pub fn partitions(&self, topic: &str) -> Vec<u32> {
        self.topic_bucket(topic)
            .map(|t| t.partitions.iter().map(|p| p.partition).collect())
            .unwrap_or_default()
    }

    /// Messages added for a topic-partition, in add order
    pub fn partition_messages(&self, topic: &str, partition: u32) -> Vec<&ProducerMessage> {
        self.positions(topic, partition)
            .map(|positions| positions.iter().map(|&i| &self.messages[i]).collect())
            .unwrap_or_default()
    }

    /// Positions recorded for a topic-partition, `None` if never added
    pub(crate) fn positions(&self, topic: &str, partition: u32) -> Option<&[usize]> {
        self.topic_bucket(topic)?.positions(partition)
    }

    fn topic_bucket(&self, topic: &str) -> Option<&TopicBucket> {
        self.topic_index.get(topic).map(|&slot| &self.topics[slot])
    }

    /// Build the produce request batches for this broker
    ///
    /// One [`WireTopicBatch`] per topic and one [`WirePartitionBatch`] per
    /// partition that received messages. When the resolver returns a codec
    /// for a topic, each of its partition sets is wrapped as a single
    /// compressed record. The group is not modified, so repeated calls yield
    /// equal output.
    pub fn build_wire_batches<R>(&self, resolver: &R) -> Result<Vec<WireTopicBatch>>
    where
        R: CompressionResolver + ?Sized,
    {
        let compressor = Compressor::with_level(resolver.level());

        self.topics
            .iter()
            .map(|bucket| -> Result<WireTopicBatch> {
                let codec = resolver
                    .codec_for(&bucket.topic)
                    .filter(|algo| algo.is_compressed());

                let partitions = bucket
                    .partitions
                    .iter()
                    .map(|p| -> Result<WirePartitionBatch> {
                        let set = MessageSet::new(
                            p.positions
                                .iter()
                                .map(|&i| self.messages[i].to_record())
                                .collect(),
                        );
                        let set = match codec {
                            Some(algo) => set.compress(algo, &compressor)?,
                            None => set,
                        };
                        Ok(WirePartitionBatch::new(p.partition, set))
                    })
                    .collect::<Result<Vec<_>>>()?;

                debug!(
                    broker = %self.broker_id,
                    topic = %bucket.topic,
                    partitions = partitions.len(),
                    bytes = partitions.iter().map(|p| p.message_set.size()).sum::<usize>(),
                    codec = codec.map(|c| c.name()).unwrap_or("none"),
                    level = ?compressor.level(),
                    "Built topic batch"
                );

                Ok(WireTopicBatch::new(bucket.topic.clone(), partitions))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompressionConfig, NoCompression};
    use rivven_core::CompressionAlgorithm;

    fn values(msgs: &[&ProducerMessage]) -> Vec<String> {
        msgs.iter()
            .map(|m| String::from_utf8_lossy(&m.value).into_owned())
            .collect()
    }

    #[test]
    fn test_empty_group() {
        let group = MessageGroup::new("broker-1");
        assert!(group.is_empty());
        assert_eq!(group.broker_id(), "broker-1");
        assert!(group.build_wire_batches(&NoCompression).unwrap().is_empty());
    }

    #[test]
    fn test_add_indexes_by_topic_and_partition() {
        let mut group = MessageGroup::new("b");
        group.add(ProducerMessage::new("t1", "m1"), 0);
        group.add(ProducerMessage::new("t2", "m2"), 3);
        group.add(ProducerMessage::new("t1", "m3"), 1);
        group.add(ProducerMessage::new("t1", "m4"), 0);

        assert_eq!(group.len(), 4);
        assert_eq!(group.topics().collect::<Vec<_>>(), vec!["t1", "t2"]);
        assert_eq!(group.partitions("t1"), vec![0, 1]);
        assert_eq!(values(&group.partition_messages("t1", 0)), vec!["m1", "m4"]);
        assert_eq!(values(&group.partition_messages("t2", 3)), vec!["m2"]);
        assert!(group.partition_messages("t2", 0).is_empty());
        assert!(group.partitions("missing").is_empty());
    }

    #[test]
    fn test_identical_messages_stay_distinct() {
        let mut group = MessageGroup::new("b");
        group.add(ProducerMessage::new("t", "same"), 0);
        group.add(ProducerMessage::new("t", "same"), 0);

        assert_eq!(group.positions("t", 0), Some([0usize, 1].as_slice()));
    }

    #[test]
    fn test_build_uncompressed() {
        let mut group = MessageGroup::new("b");
        group.add(ProducerMessage::new("t1", "m1"), 0);
        group.add(ProducerMessage::new("t1", "m2"), 1);
        group.add(ProducerMessage::new("t1", "m3"), 0);

        let batches = group.build_wire_batches(&NoCompression).unwrap();
        assert_eq!(batches.len(), 1);

        let p0 = batches[0].partition(0).unwrap();
        let payloads: Vec<_> = p0
            .message_set
            .records()
            .iter()
            .map(|r| r.value.clone())
            .collect();
        assert_eq!(payloads, vec!["m1", "m3"]);
        assert!(!p0.message_set.is_compressed());
    }

    #[test]
    fn test_build_compressed_roundtrips() {
        let mut group = MessageGroup::new("b");
        for i in 0..10 {
            group.add(ProducerMessage::new("logs", format!("line {}", i)), 2);
        }

        let config = CompressionConfig::all_topics(CompressionAlgorithm::Lz4);
        let batches = group.build_wire_batches(&config).unwrap();
        let set = &batches[0].partitions[0].message_set;

        assert_eq!(set.len(), 1);
        assert_eq!(set.compression(), Some(CompressionAlgorithm::Lz4));

        let restored = set.decompress(&Compressor::new()).unwrap();
        assert_eq!(restored.len(), 10);
        assert_eq!(restored.records()[9].value, "line 9");
    }

    #[test]
    fn test_build_with_minimum_custom_level() {
        let config: CompressionConfig = serde_json::from_str(
            r#"{"compression_type": "lz4", "level": {"custom": -2147483648}}"#,
        )
        .unwrap();
        config.validate().unwrap();

        let mut group = MessageGroup::new("b");
        group.add(ProducerMessage::new("t", "payload"), 0);

        let batches = group.build_wire_batches(&config).unwrap();
        let set = &batches[0].partitions[0].message_set;
        assert_eq!(set.compression(), Some(CompressionAlgorithm::Lz4));

        let restored = set.decompress(&Compressor::new()).unwrap();
        assert_eq!(restored.records()[0].value, "payload");
    }

    #[test]
    fn test_resolver_returning_none_algorithm_is_uncompressed() {
        let mut group = MessageGroup::new("b");
        group.add(ProducerMessage::new("t", "v"), 0);

        let resolver = |_: &str| Some(CompressionAlgorithm::None);
        let batches = group.build_wire_batches(&resolver).unwrap();
        assert!(!batches[0].partitions[0].message_set.is_compressed());
    }
}

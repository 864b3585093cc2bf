//! Rivven producer batching
//!
//! For each broker a producer sends to, this crate groups messages by topic
//! and partition, turns the grouping into wire batches (compressing per topic
//! when configured), and after the broker replies works out which messages
//! must be resent because no replica accepted them.
//!
//! Network I/O, leader discovery and partition selection live outside this
//! crate: callers hand in resolved assignments and receive wire structures
//! plus a [`DeliveryReport`].
//!
//! # Example
//!
//! ```rust,ignore
//! use rivven_client::{BrokerBatches, CompressionConfig, ProducerMessage};
//!
//! let mut batches = BrokerBatches::new();
//! batches.add("broker-1", ProducerMessage::new("orders", "a"), 0);
//! batches.add("broker-2", ProducerMessage::new("orders", "b"), 1);
//!
//! let config = CompressionConfig::default();
//! for group in batches.groups() {
//!     let request = group.build_wire_batches(&config)?;
//!     let response = send(group.broker_id(), request).await?;
//!     let report = group.classify(&response);
//!     retry_queue.extend(report.retry_owned());
//! }
//! ```

pub mod broker_batches;
pub mod compression;
pub mod delivery;
pub mod error;
pub mod message;
pub mod message_group;

pub use broker_batches::BrokerBatches;
pub use compression::{
    CompressionConfig, CompressionConfigBuilder, CompressionResolver, NoCompression,
};
pub use delivery::{DeliveryReport, MessageOutcome, PartitionErrorEvent};
pub use error::{Error, Result};
pub use message::ProducerMessage;
pub use message_group::MessageGroup;

pub use rivven_core::{CompressionAlgorithm, CompressionLevel};
pub use rivven_protocol::{
    ErrorCode, MessageSet, PartitionResponse, ProduceResponse, Record, RetryPolicy,
    TopicResponse, WirePartitionBatch, WireTopicBatch,
};

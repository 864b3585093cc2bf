//! Rivven Wire Protocol: produce path
//!
//! This crate defines the structures a producer hands to the I/O layer
//! ([`WireTopicBatch`] / [`WirePartitionBatch`] / [`MessageSet`]) and the
//! typed [`ProduceResponse`] the I/O layer hands back.
//!
//! # Example
//!
//! ```rust,ignore
//! use rivven_protocol::{ErrorCode, ProduceResponse};
//!
//! let response = ProduceResponse::new()
//!     .with_offset("orders", 0, 42)
//!     .with_partition("orders", 1, ErrorCode::NotLeaderForPartition);
//!
//! assert!(!response.is_success());
//! ```

mod error;
mod produce;
mod types;

pub use error::{ProtocolError, Result};
pub use produce::{
    ErrorCode, PartitionResponse, ProduceResponse, RetryPolicy, TopicResponse,
    WirePartitionBatch, WireTopicBatch,
};
pub use types::{MessageSet, Record};

/// Maximum message set size accepted when decoding (64 MiB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

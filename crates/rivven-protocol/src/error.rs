//! Protocol error types

use rivven_core::CompressionError;
use thiserror::Error;

/// Protocol error types
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Message set too large to decode
    #[error("Message size {0} exceeds maximum {1}")]
    MessageTooLarge(usize, usize),

    /// Codec failure while wrapping or unwrapping a message set
    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),
}

impl From<postcard::Error> for ProtocolError {
    fn from(e: postcard::Error) -> Self {
        ProtocolError::Serialization(e.to_string())
    }
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

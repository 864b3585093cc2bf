//! Shared building blocks for the Rivven produce path.

pub mod compression;

pub use compression::{
    CompressionAlgorithm, CompressionError, CompressionLevel, Compressor,
};

//! Compression codecs for produce batches
//!
//! Producers compress whole message sets, never single records. This module
//! names the supported codecs and adapts the third-party implementations
//! behind one small [`Compressor`] so the protocol layer can wrap a message
//! set without knowing which library does the work.
//!
//! | Algorithm | Kafka id | Backend        | Payload format                  |
//! |-----------|----------|----------------|---------------------------------|
//! | None      | 0        | -              | passthrough                     |
//! | Snappy    | 2        | `snap`         | raw snappy block                |
//! | LZ4       | 3        | `lz4`          | LZ4 block, size-prefixed        |
//! | Zstd      | 4        | `zstd`         | single zstd frame               |
//!
//! # Example
//!
//! ```rust,ignore
//! use rivven_core::compression::{CompressionAlgorithm, Compressor};
//!
//! let compressor = Compressor::new();
//! let data = b"Hello, World! ".repeat(100);
//! let compressed = compressor.compress(&data, CompressionAlgorithm::Zstd)?;
//! let restored = compressor.decompress(&compressed, CompressionAlgorithm::Zstd)?;
//! assert_eq!(&restored[..], &data[..]);
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for a decompressed zstd payload (64 MiB)
const MAX_DECOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

// ============================================================================
// Error Types
// ============================================================================

/// Compression-related errors
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("LZ4 compression failed: {0}")]
    Lz4Error(String),

    #[error("Zstd compression failed: {0}")]
    ZstdError(String),

    #[error("Snappy compression failed: {0}")]
    SnappyError(String),

    #[error("Unknown compression algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown Kafka compression type id: {0}")]
    UnknownKafkaTypeId(i8),
}

pub type Result<T> = std::result::Result<T, CompressionError>;

// ============================================================================
// Compression Algorithm
// ============================================================================

/// Compression codec applied to a message set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// No compression (passthrough)
    #[default]
    #[serde(alias = "uncompressed")]
    None,

    /// LZ4 - lowest latency
    Lz4,

    /// Zstd - best ratio
    #[serde(alias = "zstandard")]
    Zstd,

    /// Snappy - balanced, widely deployed with Kafka
    Snappy,
}

impl CompressionAlgorithm {
    /// All supported algorithms
    pub const ALL: [CompressionAlgorithm; 4] = [
        CompressionAlgorithm::None,
        CompressionAlgorithm::Lz4,
        CompressionAlgorithm::Zstd,
        CompressionAlgorithm::Snappy,
    ];

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
            Self::Snappy => "snappy",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "uncompressed" => Some(Self::None),
            "lz4" => Some(Self::Lz4),
            "zstd" | "zstandard" => Some(Self::Zstd),
            "snappy" => Some(Self::Snappy),
            _ => None,
        }
    }

    /// Kafka protocol compression type id (low bits of record attributes)
    pub fn kafka_type_id(&self) -> i8 {
        match self {
            Self::None => 0,
            Self::Snappy => 2,
            Self::Lz4 => 3,
            Self::Zstd => 4,
        }
    }

    /// Create from Kafka protocol compression type id
    pub fn from_kafka_type_id(id: i8) -> Result<Self> {
        match id {
            0 => Ok(Self::None),
            2 => Ok(Self::Snappy),
            3 => Ok(Self::Lz4),
            4 => Ok(Self::Zstd),
            other => Err(CompressionError::UnknownKafkaTypeId(other)),
        }
    }

    /// Check if this algorithm is actually compressing (not passthrough)
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for CompressionAlgorithm {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| CompressionError::UnknownAlgorithm(s.to_string()))
    }
}

// ============================================================================
// Compression Level
// ============================================================================

/// Compression level presets
///
/// LZ4 maps levels to block modes, Zstd to its numeric level (1-22), and
/// Snappy ignores the level entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Fastest compression, lowest ratio
    Fast,
    /// Balanced speed and ratio (default)
    #[default]
    Default,
    /// Best compression ratio, slower
    Best,
    /// Custom level (algorithm-specific)
    Custom(i32),
}

impl CompressionLevel {
    /// Get Zstd compression level (1-22, higher = better ratio)
    pub fn zstd_level(&self) -> i32 {
        match self {
            Self::Fast => 1,
            Self::Default => 3,
            Self::Best => 19,
            Self::Custom(n) => (*n).clamp(1, 22),
        }
    }

    fn lz4_mode(&self) -> lz4::block::CompressionMode {
        match *self {
            Self::Fast => lz4::block::CompressionMode::FAST(65537),
            Self::Default => lz4::block::CompressionMode::DEFAULT,
            Self::Best => lz4::block::CompressionMode::HIGHCOMPRESSION(9),
            Self::Custom(n) if n > 0 => lz4::block::CompressionMode::FAST(n),
            Self::Custom(n) => lz4::block::CompressionMode::HIGHCOMPRESSION(n.saturating_neg()),
        }
    }
}

// ============================================================================
// Codec adapters
// ============================================================================

fn compress_lz4(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    // Size-prefixed so the decoder can allocate exactly.
    lz4::block::compress(data, Some(level.lz4_mode()), true)
        .map_err(|e| CompressionError::Lz4Error(e.to_string()))
}

fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    lz4::block::decompress(data, None).map_err(|e| CompressionError::Lz4Error(e.to_string()))
}

fn compress_zstd(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    zstd::bulk::compress(data, level.zstd_level())
        .map_err(|e| CompressionError::ZstdError(e.to_string()))
}

fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::bulk::decompress(data, MAX_DECOMPRESSED_SIZE)
        .map_err(|e| CompressionError::ZstdError(e.to_string()))
}

fn compress_snappy(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = snap::raw::Encoder::new();
    encoder
        .compress_vec(data)
        .map_err(|e| CompressionError::SnappyError(e.to_string()))
}

fn decompress_snappy(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = snap::raw::Decoder::new();
    decoder
        .decompress_vec(data)
        .map_err(|e| CompressionError::SnappyError(e.to_string()))
}

// ============================================================================
// Compressor
// ============================================================================

/// Stateless front-end over the codec backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compressor {
    level: CompressionLevel,
}

impl Compressor {
    /// Create compressor with the default level
    pub fn new() -> Self {
        Self::default()
    }

    /// Create compressor with an explicit level
    pub fn with_level(level: CompressionLevel) -> Self {
        Self { level }
    }

    /// Configured level
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compress `data` with `algorithm`
    ///
    /// [`CompressionAlgorithm::None`] returns the input unchanged.
    pub fn compress(&self, data: &[u8], algorithm: CompressionAlgorithm) -> Result<Bytes> {
        let compressed = match algorithm {
            CompressionAlgorithm::None => return Ok(Bytes::copy_from_slice(data)),
            CompressionAlgorithm::Lz4 => compress_lz4(data, self.level)?,
            CompressionAlgorithm::Zstd => compress_zstd(data, self.level)?,
            CompressionAlgorithm::Snappy => compress_snappy(data)?,
        };
        Ok(Bytes::from(compressed))
    }

    /// Decompress a payload produced by [`Compressor::compress`]
    pub fn decompress(&self, data: &[u8], algorithm: CompressionAlgorithm) -> Result<Bytes> {
        let decompressed = match algorithm {
            CompressionAlgorithm::None => return Ok(Bytes::copy_from_slice(data)),
            CompressionAlgorithm::Lz4 => decompress_lz4(data)?,
            CompressionAlgorithm::Zstd => decompress_zstd(data)?,
            CompressionAlgorithm::Snappy => decompress_snappy(data)?,
        };
        Ok(Bytes::from(decompressed))
    }
}

//! Per-topic compression resolution
//!
//! The batch builder asks a [`CompressionResolver`] once per topic which codec
//! to apply. [`CompressionConfig`] is the configurable implementation: one
//! codec, applied either to every topic or only to an explicit topic list.
//!
//! ```rust,ignore
//! use rivven_client::{CompressionAlgorithm, CompressionConfig, CompressionResolver};
//!
//! let config = CompressionConfig::builder()
//!     .compression_type(CompressionAlgorithm::Snappy)
//!     .compressed_topic("clicks")
//!     .build();
//!
//! assert_eq!(config.codec_for("clicks"), Some(CompressionAlgorithm::Snappy));
//! assert_eq!(config.codec_for("orders"), None);
//! ```

use crate::{Error, Result};
use rivven_core::{CompressionAlgorithm, CompressionLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Resolves the compression codec for a topic
///
/// Implementations must be pure lookups. `None` means send uncompressed.
pub trait CompressionResolver {
    fn codec_for(&self, topic: &str) -> Option<CompressionAlgorithm>;

    /// Level used by the codec backends
    fn level(&self) -> CompressionLevel {
        CompressionLevel::Default
    }
}

impl<F> CompressionResolver for F
where
    F: Fn(&str) -> Option<CompressionAlgorithm>,
{
    fn codec_for(&self, topic: &str) -> Option<CompressionAlgorithm> {
        self(topic)
    }
}

/// Resolver that never compresses
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl CompressionResolver for NoCompression {
    fn codec_for(&self, _topic: &str) -> Option<CompressionAlgorithm> {
        None
    }
}

/// Producer compression settings
///
/// With an empty `compressed_topics` the codec applies to every topic;
/// otherwise only the listed topics are compressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Codec to apply (none, lz4, zstd, snappy)
    pub compression_type: CompressionAlgorithm,
    /// Restrict compression to these topics
    pub compressed_topics: BTreeSet<String>,
    /// Codec level
    pub level: CompressionLevel,
}

impl CompressionConfig {
    /// Create a new builder
    pub fn builder() -> CompressionConfigBuilder {
        CompressionConfigBuilder::default()
    }

    /// Compress every topic with `algorithm`
    pub fn all_topics(algorithm: CompressionAlgorithm) -> Self {
        Self {
            compression_type: algorithm,
            ..Default::default()
        }
    }

    /// Reject settings that can never take effect
    pub fn validate(&self) -> Result<()> {
        if !self.compression_type.is_compressed() && !self.compressed_topics.is_empty() {
            return Err(Error::ConfigError(
                "compressed_topics set without a compression_type".to_string(),
            ));
        }
        if self.compressed_topics.iter().any(|t| t.is_empty()) {
            return Err(Error::ConfigError(
                "compressed_topics contains an empty topic name".to_string(),
            ));
        }
        Ok(())
    }
}

impl CompressionResolver for CompressionConfig {
    fn codec_for(&self, topic: &str) -> Option<CompressionAlgorithm> {
        if !self.compression_type.is_compressed() {
            return None;
        }
        if self.compressed_topics.is_empty() || self.compressed_topics.contains(topic) {
            Some(self.compression_type)
        } else {
            None
        }
    }

    fn level(&self) -> CompressionLevel {
        self.level
    }
}

/// Builder for CompressionConfig
#[derive(Debug, Default)]
pub struct CompressionConfigBuilder {
    config: CompressionConfig,
}

impl CompressionConfigBuilder {
    /// Set the codec
    pub fn compression_type(mut self, algorithm: CompressionAlgorithm) -> Self {
        self.config.compression_type = algorithm;
        self
    }

    /// Add a topic to the compressed set
    pub fn compressed_topic(mut self, topic: impl Into<String>) -> Self {
        self.config.compressed_topics.insert(topic.into());
        self
    }

    /// Replace the compressed topic set
    pub fn compressed_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.compressed_topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Set the codec level
    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CompressionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_compresses_nothing() {
        let config = CompressionConfig::default();
        assert_eq!(config.codec_for("any"), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_codec_applies_to_all_topics_when_list_empty() {
        let config = CompressionConfig::all_topics(CompressionAlgorithm::Lz4);
        assert_eq!(config.codec_for("a"), Some(CompressionAlgorithm::Lz4));
        assert_eq!(config.codec_for("b"), Some(CompressionAlgorithm::Lz4));
    }

    #[test]
    fn test_codec_restricted_to_listed_topics() {
        let config = CompressionConfig::builder()
            .compression_type(CompressionAlgorithm::Zstd)
            .compressed_topics(["logs", "metrics"])
            .level(CompressionLevel::Fast)
            .build();

        assert_eq!(config.codec_for("logs"), Some(CompressionAlgorithm::Zstd));
        assert_eq!(config.codec_for("orders"), None);
        assert_eq!(config.level(), CompressionLevel::Fast);
    }

    #[test]
    fn test_validate_rejects_topics_without_codec() {
        let config = CompressionConfig::builder().compressed_topic("logs").build();
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = CompressionConfig::builder()
            .compression_type(CompressionAlgorithm::Snappy)
            .compressed_topic("")
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |topic: &str| (topic == "t1").then_some(CompressionAlgorithm::Snappy);
        assert_eq!(resolver.codec_for("t1"), Some(CompressionAlgorithm::Snappy));
        assert_eq!(resolver.codec_for("t2"), None);
        assert_eq!(NoCompression.codec_for("t1"), None);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: CompressionConfig = serde_json::from_str(
            r#"{"compression_type": "snappy", "compressed_topics": ["clicks"]}"#,
        )
        .unwrap();

        assert_eq!(config.compression_type, CompressionAlgorithm::Snappy);
        assert_eq!(config.level, CompressionLevel::Default);
        assert_eq!(config.codec_for("clicks"), Some(CompressionAlgorithm::Snappy));
    }
}

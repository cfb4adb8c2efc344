// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Writer and reader options for MCAP traces.
//!
//! Writer options can be loaded from TOML:
//!
//! ```toml
//! compression = "lz4"
//! chunk_size = 1048576
//! profile = "protobuf"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Result, TraceError};
use crate::io::filter::TopicFilter;

use super::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_PROFILE};

/// Chunk compression for written containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerCompression {
    /// Uncompressed chunks
    None,
    /// Zstandard
    #[default]
    Zstd,
    /// LZ4 frame
    Lz4,
}

impl ContainerCompression {
    pub(crate) fn to_mcap(self) -> Option<mcap::Compression> {
        match self {
            ContainerCompression::None => None,
            ContainerCompression::Zstd => Some(mcap::Compression::Zstd),
            ContainerCompression::Lz4 => Some(mcap::Compression::Lz4),
        }
    }
}

impl fmt::Display for ContainerCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContainerCompression::None => "none",
            ContainerCompression::Zstd => "zstd",
            ContainerCompression::Lz4 => "lz4",
        })
    }
}

impl FromStr for ContainerCompression {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(ContainerCompression::None),
            "zstd" => Ok(ContainerCompression::Zstd),
            "lz4" => Ok(ContainerCompression::Lz4),
            other => Err(TraceError::invalid_config(format!(
                "unknown compression '{other}', expected 'none', 'zstd', or 'lz4'"
            ))),
        }
    }
}

/// Options applied when an MCAP writer opens a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct McapWriterOptions {
    /// Chunk compression
    pub compression: ContainerCompression,
    /// Target uncompressed chunk size in bytes
    pub chunk_size: u64,
    /// Header profile
    pub profile: String,
}

impl Default for McapWriterOptions {
    fn default() -> Self {
        Self {
            compression: ContainerCompression::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl McapWriterOptions {
    /// Set the compression.
    pub fn with_compression(mut self, compression: ContainerCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the header profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Parse options from TOML; missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TraceError::invalid_config(e.to_string()))
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub(crate) fn to_write_options(&self) -> mcap::WriteOptions {
        mcap::WriteOptions::new()
            .compression(self.compression.to_mcap())
            .chunk_size(Some(self.chunk_size))
            .profile(self.profile.clone())
    }
}

/// Order in which an MCAP reader yields records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadOrder {
    /// As stored in the file
    File,
    /// Ascending log time; ties keep file order
    #[default]
    LogTime,
    /// Descending log time; ties keep file order
    ReverseLogTime,
}

/// Options applied when an MCAP reader opens a file.
#[derive(Debug, Clone, Default)]
pub struct McapReadOptions {
    /// Topics to yield
    pub topic_filter: TopicFilter,
    /// Inclusive lower log-time bound in nanoseconds
    pub start_time: Option<u64>,
    /// Exclusive upper log-time bound in nanoseconds
    pub end_time: Option<u64>,
    /// Record order
    pub order: ReadOrder,
}

impl McapReadOptions {
    /// Set the topic filter.
    pub fn with_topic_filter(mut self, filter: TopicFilter) -> Self {
        self.topic_filter = filter;
        self
    }

    /// Restrict to log times in `[start, end)`.
    pub fn with_time_range(mut self, start: Option<u64>, end: Option<u64>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    /// Set the read order.
    pub fn with_order(mut self, order: ReadOrder) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn accepts(&self, topic: &str, log_time: u64) -> bool {
        self.start_time.map_or(true, |start| log_time >= start)
            && self.end_time.map_or(true, |end| log_time < end)
            && self.topic_filter.should_include(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_from_str() {
        assert_eq!("zstd".parse::<ContainerCompression>().unwrap(), ContainerCompression::Zstd);
        assert_eq!("LZ4".parse::<ContainerCompression>().unwrap(), ContainerCompression::Lz4);
        assert_eq!("none".parse::<ContainerCompression>().unwrap(), ContainerCompression::None);
        assert!(matches!(
            "brotli".parse::<ContainerCompression>(),
            Err(TraceError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_writer_options_defaults() {
        let options = McapWriterOptions::default();
        assert_eq!(options.compression, ContainerCompression::Zstd);
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(options.profile, "protobuf");
    }

    #[test]
    fn test_writer_options_from_toml() {
        let options = McapWriterOptions::from_toml_str("compression = \"lz4\"\nchunk_size = 1024\n")
            .unwrap();
        assert_eq!(options.compression, ContainerCompression::Lz4);
        assert_eq!(options.chunk_size, 1024);
        assert_eq!(options.profile, DEFAULT_PROFILE);

        assert_eq!(
            McapWriterOptions::from_toml_str("").unwrap(),
            McapWriterOptions::default()
        );
    }

    #[test]
    fn test_writer_options_reject_bad_toml() {
        assert!(matches!(
            McapWriterOptions::from_toml_str("compression = \"gzip\""),
            Err(TraceError::InvalidConfig { .. })
        ));
        assert!(McapWriterOptions::from_toml_str("chunk_sz = 1").is_err());
    }

    #[test]
    fn test_read_options_accepts() {
        let options = McapReadOptions::default()
            .with_time_range(Some(10), Some(20))
            .with_topic_filter(TopicFilter::include(["gt"]));
        assert!(options.accepts("gt", 10));
        assert!(options.accepts("gt", 19));
        assert!(!options.accepts("gt", 20));
        assert!(!options.accepts("gt", 9));
        assert!(!options.accepts("sv", 15));
        assert!(McapReadOptions::default().accepts("any", 0));
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Shared metadata types for all trace file formats.

use std::collections::BTreeMap;
use std::fmt;

use prost_reflect::DynamicMessage;
use serde::Serialize;

use crate::core::MessageKind;

/// Trace container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TraceFormat {
    /// Length-framed binary (`.osi`)
    Binary,
    /// Delimited protobuf text (`.txth`)
    Text,
    /// MCAP container (`.mcap`)
    Mcap,
}

impl TraceFormat {
    /// Format named by the extension of `path`, case-insensitive.
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Option<Self> {
        super::detection::detect_format(path)
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TraceFormat::Binary => "osi",
            TraceFormat::Text => "txth",
            TraceFormat::Mcap => "mcap",
        }
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceFormat::Binary => write!(f, "binary"),
            TraceFormat::Text => write!(f, "text"),
            TraceFormat::Mcap => write!(f, "mcap"),
        }
    }
}

/// One message read from a trace.
///
/// Ownership of the message moves to the caller.
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// Decoded message
    pub message: DynamicMessage,
    /// Kind of [`Self::message`]
    pub kind: MessageKind,
    /// Topic the message was read from (MCAP only)
    pub channel_name: Option<String>,
}

impl ReadResult {
    /// Create a result without a channel.
    pub fn new(message: DynamicMessage, kind: MessageKind) -> Self {
        Self {
            message,
            kind,
            channel_name: None,
        }
    }

    /// Set the channel name.
    pub fn with_channel(mut self, channel_name: impl Into<String>) -> Self {
        self.channel_name = Some(channel_name.into());
        self
    }
}

/// A named key/value metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    /// Record name, e.g. `net.asam.osi.trace`
    pub name: String,
    /// Key/value entries
    pub entries: BTreeMap<String, String>,
}

impl FileMetadata {
    /// Create an empty record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace an entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace an entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Information about a channel in an MCAP trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    /// Channel ID within the file
    pub id: u16,
    /// Topic name
    pub topic: String,
    /// Schema name (e.g. `osi3.GroundTruth`); empty for schemaless channels
    pub schema_name: String,
    /// Schema encoding (e.g. `protobuf`)
    pub schema_encoding: String,
    /// Message encoding (e.g. `protobuf`, `json`)
    pub message_encoding: String,
    /// Channel metadata
    pub metadata: BTreeMap<String, String>,
    /// Number of messages in this channel (0 if unknown)
    pub message_count: u64,
}

impl ChannelInfo {
    /// Create a new ChannelInfo.
    pub fn new(id: u16, topic: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self {
            id,
            topic: topic.into(),
            schema_name: schema_name.into(),
            schema_encoding: String::new(),
            message_encoding: String::new(),
            metadata: BTreeMap::new(),
            message_count: 0,
        }
    }

    /// Set schema and message encodings.
    pub fn with_encodings(
        mut self,
        schema_encoding: impl Into<String>,
        message_encoding: impl Into<String>,
    ) -> Self {
        self.schema_encoding = schema_encoding.into();
        self.message_encoding = message_encoding.into();
        self
    }

    /// Set the channel metadata.
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the message count.
    pub fn with_message_count(mut self, count: u64) -> Self {
        self.message_count = count;
        self
    }
}

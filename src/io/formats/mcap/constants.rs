// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP constants for OSI traces.
//!
//! Record names and keys follow the ASAM OSI trace file conventions for
//! MCAP; the magic is defined by the [MCAP specification](https://mcap.dev/spec).

/// MCAP file magic bytes (at start and end of file).
pub const MCAP_MAGIC: [u8; 8] = [0x89, 0x4D, 0x43, 0x41, 0x50, 0x30, 0x0D, 0x0A];

/// Conventional file extension.
pub const MCAP_EXTENSION: &str = "mcap";

/// Message encoding of every OSI channel.
pub const MESSAGE_ENCODING: &str = "protobuf";

/// Schema-name prefix identifying OSI messages.
pub const OSI_SCHEMA_PREFIX: &str = "osi3.";

/// Default MCAP header profile.
pub const DEFAULT_PROFILE: &str = "protobuf";

/// Default chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Name of the metadata record every OSI MCAP trace must carry.
pub const REQUIRED_METADATA_NAME: &str = "net.asam.osi.trace";

/// Keys that must be present in [`REQUIRED_METADATA_NAME`].
pub const REQUIRED_METADATA_KEYS: [&str; 5] = [
    "version",
    "min_osi_version",
    "max_osi_version",
    "min_protobuf_version",
    "max_protobuf_version",
];

/// Channel metadata key holding the OSI version of the channel's messages.
pub const CHANNEL_OSI_VERSION_KEY: &str = "net.asam.osi.trace.channel.osi_version";

/// Channel metadata key holding the protobuf version used to serialize.
pub const CHANNEL_PROTOBUF_VERSION_KEY: &str = "net.asam.osi.trace.channel.protobuf_version";

/// Protobuf version recorded in trace metadata.
///
/// Payloads are plain proto2 wire format, readable by protobuf 3.0.0 and
/// later.
pub const PROTOBUF_VERSION: &str = "3.0.0";

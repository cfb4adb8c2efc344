// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Self-describing schema handle for a message kind.
//!
//! Containers that store schemas next to data (MCAP) need the serialized
//! `FileDescriptorSet` of a message type: its defining file plus every
//! file it transitively imports, dependencies first. Files are re-encoded
//! from the runtime pool so custom options (the OSI interface version) are
//! kept.

use std::collections::HashSet;

use prost::encoding::{encode_key, encode_varint, WireType};
use prost_reflect::{FileDescriptor, MessageDescriptor};

// `FileDescriptorSet.file`
const FILE_FIELD: u32 = 1;

/// Schema encoding written for every OSI schema.
pub const SCHEMA_ENCODING: &str = "protobuf";

/// Schema of one message type, ready to embed in a container.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    name: String,
    data: Vec<u8>,
    fingerprint: u32,
    message: MessageDescriptor,
}

impl SchemaDescriptor {
    /// Build the schema handle for a message descriptor.
    pub fn from_message(message: MessageDescriptor) -> Self {
        let mut files = Vec::new();
        let mut seen = HashSet::new();
        collect_files(&message.parent_file(), &mut seen, &mut files);

        let mut data = Vec::new();
        for file in files {
            encode_key(FILE_FIELD, WireType::LengthDelimited, &mut data);
            encode_varint(file.len() as u64, &mut data);
            data.extend_from_slice(&file);
        }
        let fingerprint = crc32fast::hash(&data);

        Self {
            name: message.full_name().to_string(),
            data,
            fingerprint,
            message,
        }
    }

    /// Fully qualified type name, e.g. `osi3.SensorView`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema encoding (`protobuf`).
    pub fn encoding(&self) -> &'static str {
        SCHEMA_ENCODING
    }

    /// Serialized `FileDescriptorSet`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// CRC-32 of [`Self::data`].
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Runtime descriptor of the message type.
    pub fn message_descriptor(&self) -> &MessageDescriptor {
        &self.message
    }

    /// Whether two handles describe the same schema record.
    pub fn same_schema(&self, other: &SchemaDescriptor) -> bool {
        self.fingerprint == other.fingerprint && self.name == other.name && self.data == other.data
    }
}

// Post-order walk so that imports precede the files that use them.
fn collect_files(
    file: &FileDescriptor,
    seen: &mut HashSet<String>,
    out: &mut Vec<Vec<u8>>,
) {
    if !seen.insert(file.name().to_string()) {
        return;
    }
    for dependency in file.dependencies() {
        collect_files(&dependency, seen, out);
    }
    out.push(file.encode_to_vec());
}

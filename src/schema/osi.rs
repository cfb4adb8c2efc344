// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bundled `osi3` protobuf schema.
//!
//! The OSI interface `.proto` files live under `proto/` and are compiled by
//! the build script into one serialized `FileDescriptorSet` (imports
//! included, dependencies first). The set is embedded here and decoded
//! with extension options intact, so the interface version stamped on
//! `osi_version.proto` survives into every schema written to a container.

use prost_reflect::DescriptorPool;

use crate::core::{Result, TraceError};

static DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/osi3_descriptor_set.bin"));

/// File carrying the `current_interface_version` option.
pub const VERSION_FILE: &str = "osi_version.proto";

/// Extension holding the interface version of the bundled files.
pub const INTERFACE_VERSION_EXTENSION: &str = "osi3.current_interface_version";

/// OSI interface version described by the bundled schema.
pub const OSI_VERSION: (u32, u32, u32) = (3, 7, 0);

/// OSI interface version as a dotted string.
pub fn osi_version_string() -> String {
    let (major, minor, patch) = OSI_VERSION;
    format!("{major}.{minor}.{patch}")
}

/// Serialized `FileDescriptorSet` of every bundled file.
pub fn file_descriptor_set_bytes() -> &'static [u8] {
    DESCRIPTOR_SET
}

/// Build the descriptor pool for the bundled schema.
pub fn descriptor_pool() -> Result<DescriptorPool> {
    DescriptorPool::decode(DESCRIPTOR_SET)
        .map_err(|e| TraceError::invalid_schema("osi3", e.to_string()))
}

/// Interface version stamped on the version file of `pool`, if any.
pub fn interface_version(pool: &DescriptorPool) -> Option<(u32, u32, u32)> {
    let file = pool.get_file_by_name(VERSION_FILE)?;
    let extension = pool.get_extension_by_name(INTERFACE_VERSION_EXTENSION)?;

    let options = file.options();
    if !options.has_extension(&extension) {
        return None;
    }
    let value = options.get_extension(&extension);
    let version = value.as_message()?;
    let part = |name: &str| version.get_field_by_name(name).and_then(|v| v.as_u32());

    Some((
        part("version_major")?,
        part("version_minor")?,
        part("version_patch")?,
    ))
}

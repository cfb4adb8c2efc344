// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP container traces (`.mcap`).
//!
//! An OSI MCAP trace holds any number of channels, each bound to one
//! `osi3.*` protobuf schema, plus the required `net.asam.osi.trace`
//! metadata record. Containers may also carry channels of other encodings;
//! the reader skips or rejects those on request.
//!
//! Reading and writing go through the `mcap` crate; this module adds the
//! OSI rules on top.

pub mod constants;
pub mod options;
pub mod reader;
pub mod writer;

pub use constants::{
    MCAP_MAGIC, MESSAGE_ENCODING, OSI_SCHEMA_PREFIX, REQUIRED_METADATA_KEYS,
    REQUIRED_METADATA_NAME,
};
pub use options::{ContainerCompression, McapReadOptions, McapWriterOptions, ReadOrder};
pub use reader::McapTraceFileReader;
pub use writer::{McapContainer, McapTraceFileWriter};

use crate::schema::SCHEMA_ENCODING;

/// Whether a schema identifies an OSI message: `protobuf` schema encoding
/// and a name under the `osi3.` package.
pub fn is_osi_schema(encoding: &str, name: &str) -> bool {
    encoding == SCHEMA_ENCODING && name.starts_with(OSI_SCHEMA_PREFIX)
}

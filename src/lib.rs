// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # osi-trace
//!
//! Reading, writing, and converting ASAM OSI trace files.
//!
//! Three container formats are supported, organized by format:
//! - **Binary** (`.osi`) in [`io::formats::binary`]: `[u32 LE length][payload]` records
//! - **Text** (`.txth`) in [`io::formats::txth`]: protobuf text blocks
//! - **MCAP** (`.mcap`) in [`io::formats::mcap`]: channels, schemas, and metadata
//!
//! ## Architecture
//!
//! - `core/` - Errors and the [`MessageKind`] enum
//! - `schema/` - Bundled `osi3` protobuf schema and per-kind schema handles
//! - `encoding/` - Per-kind codecs and the global message registry
//! - `io/` - Reader/writer traits, format detection, and the formats
//!
//! ## Example: Writing and reading a binary trace
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use osi_trace::encoding::{new_message, set_timestamp};
//! use osi_trace::io::formats::binary::{BinaryTraceFileReader, BinaryTraceFileWriter};
//! use osi_trace::io::traits::{MessageWriter, TraceFileReader, TraceFileWriter};
//! use osi_trace::MessageKind;
//!
//! let mut writer = BinaryTraceFileWriter::new();
//! writer.open("run_gt_.osi".as_ref())?;
//! let mut msg = new_message(MessageKind::GroundTruth)?;
//! set_timestamp(&mut msg, 123, 456)?;
//! writer.write_message(&msg)?;
//! writer.close()?;
//!
//! let mut reader = BinaryTraceFileReader::new();
//! reader.open("run_gt_.osi".as_ref())?;
//! for result in reader.messages() {
//!     println!("{}", result?.kind);
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use crate::core::{MessageKind, Result, TraceError};

// Bundled schema
pub mod schema;

// Codecs and registry
pub mod encoding;

// Readers, writers, and formats
pub mod io;

pub use io::formats::binary::{BinaryTraceFileReader, BinaryTraceFileWriter};
pub use io::formats::mcap::{McapTraceFileReader, McapTraceFileWriter};
pub use io::formats::txth::{TxthTraceFileReader, TxthTraceFileWriter};
pub use io::metadata::{ChannelInfo, FileMetadata, ReadResult, TraceFormat};
pub use io::traits::{MessageWriter, TraceFileReader, TraceFileWriter};
pub use io::open_reader;

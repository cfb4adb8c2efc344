// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for OSI trace files.
//!
//! This module provides the reader/writer contracts, the three container
//! formats, and helpers for picking a format from a path.

pub mod detection;
pub mod filter;
pub mod formats;
pub mod metadata;
pub mod traits;

use std::path::Path;

pub use detection::{detect_format, is_mcap_file, TraceFileName};
pub use filter::TopicFilter;
pub use metadata::{ChannelInfo, FileMetadata, ReadResult, TraceFormat};
pub use traits::{MessageWriter, Messages, TraceFileReader, TraceFileWriter};

use crate::core::{MessageKind, Result, TraceError};
use formats::binary::BinaryTraceFileReader;
use formats::mcap::McapTraceFileReader;
use formats::txth::TxthTraceFileReader;

/// Open a reader for `path`, choosing the format from the extension.
///
/// `kind` applies to single-kind formats; MCAP readers take the kind from
/// each channel's schema. MCAP files are opened with non-OSI records
/// skipped when `skip_non_osi` is set.
pub fn open_reader(
    path: &Path,
    kind: Option<MessageKind>,
    skip_non_osi: bool,
) -> Result<Box<dyn TraceFileReader>> {
    let format = detect_format(path).ok_or_else(|| {
        TraceError::invalid_extension(path.display().to_string(), "osi|txth|mcap")
    })?;
    let reader: Box<dyn TraceFileReader> = match format {
        TraceFormat::Binary => {
            let mut reader = BinaryTraceFileReader::new();
            reader.open_with_kind(path, kind)?;
            Box::new(reader)
        }
        TraceFormat::Text => {
            let mut reader = TxthTraceFileReader::new();
            reader.open_with_kind(path, kind)?;
            Box::new(reader)
        }
        TraceFormat::Mcap => {
            let mut reader = McapTraceFileReader::new();
            reader.set_skip_non_osi_msgs(skip_non_osi);
            reader.open(path)?;
            Box::new(reader)
        }
    };
    Ok(reader)
}

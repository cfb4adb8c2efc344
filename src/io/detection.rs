// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format and message-kind detection from trace file paths.
//!
//! # Example
//!
//! ```rust
//! use osi_trace::io::detection::{detect_format, TraceFileName};
//! use osi_trace::io::metadata::TraceFormat;
//! use osi_trace::MessageKind;
//!
//! assert_eq!(detect_format("run_gt_.osi"), Some(TraceFormat::Binary));
//!
//! let name = TraceFileName::parse("20210818T150542Z_sv_370_3200_42_highway.osi").unwrap();
//! assert_eq!(name.kind, MessageKind::SensorView);
//! assert_eq!(name.frame_count, 42);
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::core::{MessageKind, Result, TraceError};
use crate::io::formats::mcap::constants::MCAP_MAGIC;

use super::metadata::TraceFormat;

/// Timestamp layout at the start of conventionally named trace files.
pub const FILE_NAME_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

const FILE_NAME_TIMESTAMP_LEN: usize = 16;

/// Detect the trace format from the file extension.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<TraceFormat> {
    let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "osi" => Some(TraceFormat::Binary),
        "txth" => Some(TraceFormat::Text),
        "mcap" => Some(TraceFormat::Mcap),
        _ => None,
    }
}

/// Check whether the file starts with the MCAP magic.
pub fn is_mcap_file<P: AsRef<Path>>(path: P) -> bool {
    let mut header = [0u8; 8];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut header))
        .map(|_| header == MCAP_MAGIC)
        .unwrap_or(false)
}

/// Require `path` to carry exactly the extension `expected`.
pub fn require_extension(path: &Path, expected: &'static str) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == expected => Ok(()),
        _ => Err(TraceError::invalid_extension(
            path.display().to_string(),
            expected,
        )),
    }
}

/// Use `requested` when it names a real kind, else infer from the file name.
pub fn resolve_kind(path: &Path, requested: Option<MessageKind>) -> Result<MessageKind> {
    match requested {
        Some(kind) if kind.is_known() => Ok(kind),
        _ => MessageKind::infer_from_path(path).ok_or_else(|| TraceError::AmbiguousKind {
            path: path.display().to_string(),
        }),
    }
}

/// Parse the `YYYYMMDDTHHMMSSZ` prefix of a trace file name.
pub fn timestamp_from_file_name(path: &Path) -> Option<DateTime<Utc>> {
    let name = path.file_name()?.to_str()?;
    let prefix = name.get(..FILE_NAME_TIMESTAMP_LEN)?;
    NaiveDateTime::parse_from_str(prefix, FILE_NAME_TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

/// Components of a file name following the OSI trace naming convention:
/// `<timestamp>_<kind>_<osi-version>_<protobuf-version>_<frames>_<name>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFileName {
    /// Recording time
    pub timestamp: DateTime<Utc>,
    /// Message kind from the abbreviation
    pub kind: MessageKind,
    /// OSI version as written (e.g. `370` or `3.7.0`)
    pub osi_version: String,
    /// Protobuf version as written
    pub protobuf_version: String,
    /// Number of frames in the trace
    pub frame_count: u64,
    /// Free-form trace name
    pub name: String,
    /// Container format from the extension
    pub format: TraceFormat,
}

fn naming_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^(?P<ts>\d{8}T\d{6}Z)_(?P<kind>[a-z]+)_(?P<osi>[0-9.]+)_(?P<pb>[0-9.]+)_(?P<frames>\d+)_(?P<name>.+)\.(?P<ext>osi|txth|mcap)$",
            )
            .ok()
        })
        .as_ref()
}

impl TraceFileName {
    /// Parse a path's file name; `None` if it does not follow the convention.
    pub fn parse<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let file_name = path.file_name()?.to_str()?;
        let caps = naming_pattern()?.captures(file_name)?;

        let timestamp = NaiveDateTime::parse_from_str(&caps["ts"], FILE_NAME_TIMESTAMP_FORMAT)
            .ok()?
            .and_utc();

        Some(Self {
            timestamp,
            kind: MessageKind::from_abbreviation(&caps["kind"])?,
            osi_version: caps["osi"].to_string(),
            protobuf_version: caps["pb"].to_string(),
            frame_count: caps["frames"].parse().ok()?,
            name: caps["name"].to_string(),
            format: detect_format(path)?,
        })
    }

    /// Render the conventional file name.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}.{}",
            self.timestamp.format(FILE_NAME_TIMESTAMP_FORMAT),
            self.kind.abbreviation(),
            self.osi_version,
            self.protobuf_version,
            self.frame_count,
            self.name,
            self.format.extension()
        )
    }
}

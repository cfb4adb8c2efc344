// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Length-framed binary traces (`.osi`).
//!
//! A trace is a flat sequence of records with no header or footer:
//!
//! ```text
//! +----------------+---------------------------+
//! | u32 LE length  | protobuf payload (length) |
//! +----------------+---------------------------+
//! ```
//!
//! Every record holds one message of the same kind; the kind is not stored
//! in the file and comes from the caller or the file name.

pub mod reader;
pub mod writer;

pub use reader::BinaryTraceFileReader;
pub use writer::BinaryTraceFileWriter;

/// Required file extension.
pub const BINARY_EXTENSION: &str = "osi";

/// Size of the record length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

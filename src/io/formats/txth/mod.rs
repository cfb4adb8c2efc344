// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Human-readable text traces (`.txth`).
//!
//! Messages are stored in protobuf text format, one after another, with no
//! explicit separator. A reader treats the first line of the file as the
//! block delimiter: a new message starts wherever that exact line recurs.
//!
//! A block whose first line differs from the delimiter, or a message that
//! contains the delimiter line internally, is split incorrectly. Traces
//! produced by [`TxthTraceFileWriter`] for a single kind start every block
//! with the same line, so they read back intact.

pub mod reader;
pub mod writer;

pub use reader::TxthTraceFileReader;
pub use writer::TxthTraceFileWriter;

/// Required file extension.
pub const TEXT_EXTENSION: &str = "txth";

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout osi-trace.
//!
//! - [`TraceError`] - Error handling for every reader and writer
//! - [`MessageKind`] - The closed set of top-level OSI messages

pub mod error;
pub mod kind;

pub use error::{Result, TraceError};
pub use kind::{MessageKind, OSI_PACKAGE};

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Trace container implementations.
//!
//! - [`binary`]: length-framed `.osi` traces
//! - [`txth`]: delimited protobuf text `.txth` traces
//! - [`mcap`]: multiplexed `.mcap` containers

pub mod binary;
pub mod mcap;
pub mod txth;

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! OSI schema definitions.
//!
//! - [`osi`] - Bundled `osi3` protobuf files and the descriptor pool built from them
//! - [`descriptor`] - Per-kind [`SchemaDescriptor`] embedded into containers

pub mod descriptor;
pub mod osi;

pub use descriptor::{SchemaDescriptor, SCHEMA_ENCODING};
pub use osi::{descriptor_pool, interface_version, osi_version_string, OSI_VERSION};

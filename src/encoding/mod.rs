// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message encoding and decoding.
//!
//! - [`codec`] - Per-kind protobuf wire and text codec
//! - [`registry`] - Kind to schema/codec lookup tables
//! - [`message`] - Helpers for dynamic OSI messages (timestamps, kind lookup)

pub mod codec;
pub mod message;
pub mod registry;

pub use codec::MessageCodec;
pub use message::{message_kind, new_message, set_timestamp, timestamp, timestamp_nanos};
pub use registry::{global_registry, MessageRegistry};

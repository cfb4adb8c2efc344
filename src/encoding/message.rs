// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Helpers for working with OSI messages as dynamic messages.

use prost_reflect::{DynamicMessage, ReflectMessage, Value};

use crate::core::{MessageKind, Result, TraceError};

use super::registry::global_registry;

const TIMESTAMP_FIELD: &str = "timestamp";

/// Create an empty message of `kind`.
pub fn new_message(kind: MessageKind) -> Result<DynamicMessage> {
    Ok(global_registry()?.codec_for(kind)?.new_message())
}

/// Resolve the kind of a message from its type name.
pub fn message_kind(message: &DynamicMessage) -> Result<MessageKind> {
    global_registry()?.kind_for_type_name(message.descriptor().full_name())
}

/// Set `timestamp.seconds` and `timestamp.nanos`.
///
/// Fails for kinds without a timestamp (`SensorViewConfiguration`).
pub fn set_timestamp(message: &mut DynamicMessage, seconds: i64, nanos: u32) -> Result<()> {
    let descriptor = message.descriptor();
    let field = descriptor
        .get_field_by_name(TIMESTAMP_FIELD)
        .ok_or_else(|| {
            TraceError::invalid_schema(descriptor.full_name(), "message has no timestamp field")
        })?;
    let kind = field.kind();
    let timestamp_desc = kind.as_message().ok_or_else(|| {
        TraceError::invalid_schema(descriptor.full_name(), "timestamp is not a message")
    })?;

    let mut timestamp = DynamicMessage::new(timestamp_desc.clone());
    timestamp.set_field_by_name("seconds", Value::I64(seconds));
    timestamp.set_field_by_name("nanos", Value::U32(nanos));
    message.set_field(&field, Value::Message(timestamp));
    Ok(())
}

/// Read `timestamp` as `(seconds, nanos)` if the message carries one.
pub fn timestamp(message: &DynamicMessage) -> Option<(i64, u32)> {
    if !message.has_field_by_name(TIMESTAMP_FIELD) {
        return None;
    }
    let value = message.get_field_by_name(TIMESTAMP_FIELD)?;
    let timestamp = value.as_message()?;
    let seconds = timestamp.get_field_by_name("seconds")?.as_i64()?;
    let nanos = timestamp.get_field_by_name("nanos")?.as_u32()?;
    Some((seconds, nanos))
}

/// Timestamp in nanoseconds, clamped to the `u64` range.
///
/// Returns 0 when the message has no timestamp.
pub fn timestamp_nanos(message: &DynamicMessage) -> u64 {
    match timestamp(message) {
        Some((seconds, nanos)) => {
            let total = i128::from(seconds) * 1_000_000_000 + i128::from(nanos);
            u64::try_from(total.max(0)).unwrap_or(u64::MAX)
        }
        None => 0,
    }
}

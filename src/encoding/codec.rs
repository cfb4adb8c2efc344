// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-kind protobuf codec using prost-reflect for dynamic message handling.
//!
//! A [`MessageCodec`] is bound to exactly one message kind. It parses wire
//! bytes and protobuf text into [`DynamicMessage`]s of that kind and
//! serializes them back, rejecting messages of any other type.

use prost::Message;
use prost_reflect::text_format::FormatOptions;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};

use crate::core::{MessageKind, Result, TraceError};

/// Parser/serializer pair for one message kind.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    kind: MessageKind,
    descriptor: MessageDescriptor,
}

impl MessageCodec {
    /// Create a codec for `kind` backed by its runtime descriptor.
    pub fn new(kind: MessageKind, descriptor: MessageDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// Kind handled by this codec.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Runtime descriptor of the message type.
    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    /// Create an empty message of this kind.
    pub fn new_message(&self) -> DynamicMessage {
        DynamicMessage::new(self.descriptor.clone())
    }

    /// Parse protobuf wire bytes.
    ///
    /// An empty buffer yields the default message.
    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicMessage> {
        DynamicMessage::decode(self.descriptor.clone(), bytes)
            .map_err(|e| TraceError::deserialization(self.descriptor.full_name(), e.to_string()))
    }

    /// Serialize to protobuf wire bytes.
    pub fn encode(&self, message: &DynamicMessage) -> Result<Vec<u8>> {
        self.check_type(message)?;
        Ok(message.encode_to_vec())
    }

    /// Parse the protobuf text format.
    pub fn decode_text(&self, text: &str) -> Result<DynamicMessage> {
        DynamicMessage::parse_text_format(self.descriptor.clone(), text)
            .map_err(|e| TraceError::deserialization(self.descriptor.full_name(), e.to_string()))
    }

    /// Render the message in protobuf text format, one field per line.
    ///
    /// Non-empty output always ends with a newline.
    pub fn encode_text(&self, message: &DynamicMessage) -> Result<String> {
        self.check_type(message)?;
        let mut text = message.to_text_format_with_options(&FormatOptions::new().pretty(true));
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    fn check_type(&self, message: &DynamicMessage) -> Result<()> {
        let actual = message.descriptor();
        if actual.full_name() != self.descriptor.full_name() {
            return Err(TraceError::serialization(
                self.descriptor.full_name(),
                format!("message is of type '{}'", actual.full_name()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::osi::descriptor_pool;
    use prost_reflect::Value;

    fn codec(kind: MessageKind) -> MessageCodec {
        let pool = descriptor_pool().unwrap();
        MessageCodec::new(kind, pool.get_message_by_name(&kind.schema_name()).unwrap())
    }

    fn ground_truth(codec: &MessageCodec, seconds: i64, nanos: u32) -> DynamicMessage {
        let mut msg = codec.new_message();
        let ts_desc = codec
            .descriptor()
            .get_field_by_name("timestamp")
            .unwrap()
            .kind();
        let mut ts = DynamicMessage::new(ts_desc.as_message().unwrap().clone());
        ts.set_field_by_name("seconds", Value::I64(seconds));
        ts.set_field_by_name("nanos", Value::U32(nanos));
        msg.set_field_by_name("timestamp", Value::Message(ts));
        msg
    }

    #[test]
    fn test_binary_round_trip() {
        let codec = codec(MessageKind::GroundTruth);
        let msg = ground_truth(&codec, 123, 456);

        let bytes = codec.encode(&msg).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_empty_payload_is_default_message() {
        let codec = codec(MessageKind::SensorView);
        let decoded = codec.decode(&[]).unwrap();
        assert_eq!(decoded, codec.new_message());
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let codec = codec(MessageKind::GroundTruth);
        let err = codec.decode(&[0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, TraceError::DeserializationFailed { .. }));
    }

    #[test]
    fn test_text_round_trip() {
        let codec = codec(MessageKind::GroundTruth);
        let msg = ground_truth(&codec, 1, 2);

        let text = codec.encode_text(&msg).unwrap();
        assert!(text.starts_with("timestamp"));
        assert!(text.ends_with('\n'));
        assert!(text.contains("seconds: 1"));

        let parsed = codec.decode_text(&text).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_rejects_other_message_type() {
        let gt = codec(MessageKind::GroundTruth);
        let sv = codec(MessageKind::SensorView);
        let err = gt.encode(&sv.new_message()).unwrap_err();
        assert!(matches!(err, TraceError::SerializationFailed { .. }));
        assert!(gt.encode_text(&sv.new_message()).is_err());
    }

    #[test]
    fn test_invalid_text_fails() {
        let codec = codec(MessageKind::GroundTruth);
        let err = codec.decode_text("no_such_field: 1\n").unwrap_err();
        assert!(matches!(err, TraceError::DeserializationFailed { .. }));
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binary (`.osi`) trace tests.
//!
//! Tests cover:
//! - Round trips for single messages, sequences, and every kind
//! - Record framing on disk
//! - Kind inference from file names
//! - Truncated and malformed records
//! - Session lifecycle

mod common;

use std::fs;

use byteorder::{LittleEndian, WriteBytesExt};

use common::{ground_truth, stamped, temp_dir, write_ground_truth_trace};
use osi_trace::encoding::{global_registry, timestamp};
use osi_trace::io::formats::binary::LENGTH_PREFIX_SIZE;
use osi_trace::{
    BinaryTraceFileReader, BinaryTraceFileWriter, MessageKind, MessageWriter, TraceError,
    TraceFileReader, TraceFileWriter,
};

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_ground_truth_round_trip() {
    let dir = temp_dir("binary");
    let path = dir.path("test_gt_.osi");

    let mut writer = BinaryTraceFileWriter::new();
    writer.open(&path).unwrap();
    writer.write_message(&ground_truth(123, 456)).unwrap();
    writer.close().unwrap();

    let mut reader = BinaryTraceFileReader::new();
    reader.open(&path).unwrap();
    assert!(reader.has_next());

    let result = reader.read_message().unwrap();
    assert_eq!(result.kind, MessageKind::GroundTruth);
    assert_eq!(result.channel_name, None);
    assert_eq!(timestamp(&result.message), Some((123, 456)));

    assert!(!reader.has_next());
    assert!(matches!(
        reader.read_message(),
        Err(TraceError::NoMoreMessages)
    ));
}

#[test]
fn test_sequence_preserves_order() {
    let dir = temp_dir("binary");
    let path = dir.path("seq_gt_.osi");
    write_ground_truth_trace(&path, 25);

    let mut reader = BinaryTraceFileReader::new();
    reader.open(&path).unwrap();
    let seconds: Vec<i64> = reader
        .messages()
        .map(|r| timestamp(&r.unwrap().message).unwrap().0)
        .collect();
    assert_eq!(seconds, (0..25).collect::<Vec<_>>());
}

#[test]
fn test_every_kind_round_trips() {
    let dir = temp_dir("binary");

    for kind in MessageKind::ALL {
        let path = dir.path(&format!("all_{}_.osi", kind.abbreviation()));
        let msg = if kind == MessageKind::SensorViewConfiguration {
            global_registry().unwrap().codec_for(kind).unwrap().new_message()
        } else {
            stamped(kind, 7, 8)
        };

        let mut writer = BinaryTraceFileWriter::new();
        writer.open(&path).unwrap();
        writer.write_message(&msg).unwrap();
        writer.write_message(&msg).unwrap();
        writer.close().unwrap();

        let mut reader = BinaryTraceFileReader::new();
        reader.open(&path).unwrap();
        assert_eq!(reader.kind(), Some(kind));

        let results: Vec<_> = reader.messages().map(|r| r.unwrap()).collect();
        assert_eq!(results.len(), 2, "{kind}");
        for result in results {
            assert_eq!(result.kind, kind);
            assert_eq!(result.message, msg, "{kind}");
        }
    }
}

#[test]
fn test_explicit_kind_overrides_name() {
    let dir = temp_dir("binary");
    let path = dir.path("plain.osi");
    write_ground_truth_trace(&path, 2);

    let mut reader = BinaryTraceFileReader::new();
    reader
        .open_with_kind(&path, Some(MessageKind::GroundTruth))
        .unwrap();
    assert_eq!(reader.messages().count(), 2);
}

// ============================================================================
// Framing
// ============================================================================

#[test]
fn test_file_is_length_framed() {
    let dir = temp_dir("binary");
    let path = dir.path("frames_gt_.osi");

    let messages = [ground_truth(1, 0), ground_truth(2, 500), ground_truth(3, 0)];
    let mut writer = BinaryTraceFileWriter::new();
    writer.open(&path).unwrap();
    for msg in &messages {
        writer.write_message(msg).unwrap();
    }
    assert_eq!(writer.messages_written(), 3);
    writer.close().unwrap();

    let bytes = fs::read(&path).unwrap();
    let codec = global_registry()
        .unwrap()
        .codec_for(MessageKind::GroundTruth)
        .unwrap();

    let mut offset = 0;
    for msg in &messages {
        let len_bytes: [u8; 4] = bytes[offset..offset + LENGTH_PREFIX_SIZE].try_into().unwrap();
        let len = u32::from_le_bytes(len_bytes) as usize;
        offset += LENGTH_PREFIX_SIZE;
        assert_eq!(codec.decode(&bytes[offset..offset + len]).unwrap(), *msg);
        offset += len;
    }
    assert_eq!(offset, bytes.len());
}

#[test]
fn test_empty_file_has_no_messages() {
    let dir = temp_dir("binary");
    let path = dir.path("empty_gt_.osi");
    fs::write(&path, b"").unwrap();

    let mut reader = BinaryTraceFileReader::new();
    reader.open(&path).unwrap();
    assert!(!reader.has_next());
    assert_eq!(reader.messages().count(), 0);
}

// ============================================================================
// Corruption
// ============================================================================

#[test]
fn test_declared_length_past_end_is_truncated() {
    let dir = temp_dir("binary");
    let path = dir.path("short_gt_.osi");
    write_ground_truth_trace(&path, 1);

    let mut bytes = fs::read(&path).unwrap();
    let good_len = bytes.len() as u64;
    bytes.write_u32::<LittleEndian>(100).unwrap();
    bytes.extend_from_slice(&[0u8; 10]);
    fs::write(&path, &bytes).unwrap();

    let mut reader = BinaryTraceFileReader::new();
    reader.open(&path).unwrap();
    assert!(reader.read_message().is_ok());

    match reader.read_message() {
        Err(TraceError::TruncatedRecord {
            offset,
            expected,
            available,
        }) => {
            assert_eq!(offset, good_len);
            assert_eq!(expected, 100);
            assert_eq!(available, 10);
        }
        other => panic!("expected TruncatedRecord, got {other:?}"),
    }
    assert!(!reader.has_next());
}

#[test]
fn test_partial_length_prefix_is_truncated() {
    let dir = temp_dir("binary");
    let path = dir.path("prefix_gt_.osi");
    fs::write(&path, [1u8, 0]).unwrap();

    let mut reader = BinaryTraceFileReader::new();
    reader.open(&path).unwrap();
    assert!(reader.has_next());
    assert!(matches!(
        reader.read_message(),
        Err(TraceError::TruncatedRecord { expected: 4, .. })
    ));
    assert!(!reader.has_next());
}

#[test]
fn test_garbage_payload_fails_to_decode() {
    let dir = temp_dir("binary");
    let path = dir.path("garbage_gt_.osi");
    let mut bytes = Vec::new();
    bytes.write_u32::<LittleEndian>(3).unwrap();
    bytes.extend_from_slice(&[0xff, 0xff, 0xff]);
    fs::write(&path, &bytes).unwrap();

    let mut reader = BinaryTraceFileReader::new();
    reader.open(&path).unwrap();
    let err = reader.read_message().unwrap_err();
    assert!(matches!(err, TraceError::DeserializationFailed { .. }));

    let mut reader = BinaryTraceFileReader::new();
    reader.open(&path).unwrap();
    let results: Vec<_> = reader.messages().collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}

// ============================================================================
// Open Errors and Lifecycle
// ============================================================================

#[test]
fn test_kind_cannot_be_inferred() {
    let dir = temp_dir("binary");
    let path = dir.path("invalid_filename.osi");
    write_ground_truth_trace(&path, 1);

    let mut reader = BinaryTraceFileReader::new();
    assert!(matches!(
        reader.open(&path),
        Err(TraceError::AmbiguousKind { .. })
    ));
    assert!(!reader.is_open());
}

#[test]
fn test_wrong_extension_and_missing_file() {
    let dir = temp_dir("binary");

    let mut reader = BinaryTraceFileReader::new();
    assert!(matches!(
        reader.open(&dir.path("trace_gt_.txth")),
        Err(TraceError::InvalidExtension { .. })
    ));
    assert!(matches!(
        reader.open(&dir.path("missing_gt_.osi")),
        Err(TraceError::NotFound { .. })
    ));

    let mut writer = BinaryTraceFileWriter::new();
    assert!(matches!(
        writer.open(&dir.path("out_gt_.mcap")),
        Err(TraceError::InvalidExtension { .. })
    ));
}

#[test]
fn test_reopen_after_close() {
    let dir = temp_dir("binary");
    let first = dir.path("first_gt_.osi");
    let second = dir.path("second_gt_.osi");
    write_ground_truth_trace(&first, 1);
    write_ground_truth_trace(&second, 3);

    let mut reader = BinaryTraceFileReader::new();
    reader.open(&first).unwrap();
    assert!(matches!(
        reader.open(&second),
        Err(TraceError::AlreadyOpen { .. })
    ));
    reader.close();
    assert!(!reader.is_open());
    assert!(matches!(
        reader.read_message(),
        Err(TraceError::NotOpen { .. })
    ));

    reader.open(&second).unwrap();
    assert_eq!(reader.messages().count(), 3);
}

#[test]
fn test_write_after_close_fails() {
    let dir = temp_dir("binary");
    let mut writer = BinaryTraceFileWriter::new();
    writer.open(&dir.path("closed_gt_.osi")).unwrap();
    writer.close().unwrap();
    writer.close().unwrap();
    assert!(matches!(
        writer.write_message(&ground_truth(1, 0)),
        Err(TraceError::NotOpen { .. })
    ));
}

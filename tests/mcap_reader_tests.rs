// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP reader tests.
//!
//! Tests cover:
//! - Non-OSI records with and without skipping
//! - Read order, topic filters, and time ranges
//! - Unknown OSI schemas and corrupt containers
//! - Format dispatch through `open_reader`

mod common;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use common::{ground_truth, open_mcap_writer, stamped, temp_dir, write_ground_truth_trace};
use osi_trace::encoding::timestamp;
use osi_trace::io::formats::mcap::{McapReadOptions, McapTraceFileWriter, ReadOrder};
use osi_trace::io::TopicFilter;
use osi_trace::{
    open_reader, McapTraceFileReader, MessageKind, TraceError, TraceFileReader, TraceFileWriter,
};

/// Two OSI messages on `gt` with one JSON message between them.
fn write_mixed_trace(path: &Path) {
    let mut writer = open_mcap_writer(path);
    writer
        .add_channel_for_kind("gt", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    writer.write_message(&ground_truth(1, 0), "gt").unwrap();

    let container = writer.container_mut().unwrap();
    let schema_id = container
        .add_schema("example.Status", "jsonschema", br#"{"type":"object"}"#)
        .unwrap();
    let channel_id = container
        .add_channel(schema_id, "status", "json", &BTreeMap::new())
        .unwrap();
    container
        .write_to_known_channel(
            &mcap::records::MessageHeader {
                channel_id,
                sequence: 0,
                log_time: 1_500_000_000,
                publish_time: 1_500_000_000,
            },
            br#"{"ok":true}"#,
        )
        .unwrap();

    writer.write_message(&ground_truth(2, 0), "gt").unwrap();
    writer.close().unwrap();
}

/// `gt` and `sv` channels with messages written out of time order.
fn write_two_topic_trace(path: &Path) {
    let mut writer = open_mcap_writer(path);
    writer
        .add_channel_for_kind("gt", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    writer
        .add_channel_for_kind("sv", MessageKind::SensorView, BTreeMap::new())
        .unwrap();
    writer.write_message(&ground_truth(3, 0), "gt").unwrap();
    writer
        .write_message(&stamped(MessageKind::SensorView, 1, 0), "sv")
        .unwrap();
    writer.write_message(&ground_truth(2, 0), "gt").unwrap();
    writer
        .write_message(&stamped(MessageKind::SensorView, 4, 0), "sv")
        .unwrap();
    writer.close().unwrap();
}

fn read_seconds(reader: &mut McapTraceFileReader) -> Vec<(String, i64)> {
    reader
        .messages()
        .map(|r| {
            let r = r.unwrap();
            (
                r.channel_name.unwrap(),
                timestamp(&r.message).unwrap().0,
            )
        })
        .collect()
}

// ============================================================================
// Non-OSI Records
// ============================================================================

#[test]
fn test_skip_non_osi_records() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("mixed.mcap");
    write_mixed_trace(&path);

    let mut reader = McapTraceFileReader::new();
    reader.set_skip_non_osi_msgs(true);
    reader.open(&path).unwrap();
    assert_eq!(reader.channels().unwrap().len(), 2);

    let results: Vec<_> = reader.messages().map(|r| r.unwrap()).collect();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.kind == MessageKind::GroundTruth));
    assert!(!reader.has_next());
}

#[test]
fn test_non_osi_record_is_an_error_without_skipping() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("mixed.mcap");
    write_mixed_trace(&path);

    let mut reader = McapTraceFileReader::new();
    reader.open(&path).unwrap();

    let first = reader.read_message().unwrap();
    assert_eq!(timestamp(&first.message), Some((1, 0)));

    match reader.read_message() {
        Err(TraceError::UnsupportedEncoding {
            topic,
            schema,
            encoding,
        }) => {
            assert_eq!(topic, "status");
            assert_eq!(schema, "example.Status");
            assert_eq!(encoding, "jsonschema");
        }
        other => panic!("expected UnsupportedEncoding, got {other:?}"),
    }
    // The offending record stays queued.
    assert!(reader.has_next());
    assert_eq!(reader.remaining(), 2);
    assert!(matches!(
        reader.read_message(),
        Err(TraceError::UnsupportedEncoding { .. })
    ));

    // Switching policy mid-read skips it.
    reader.set_skip_non_osi_msgs(true);
    let last = reader.read_message().unwrap();
    assert_eq!(timestamp(&last.message), Some((2, 0)));
    assert!(!reader.has_next());
}

#[test]
fn test_unknown_osi_schema_is_consumed() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("lane.mcap");

    let mut writer = open_mcap_writer(&path);
    let container = writer.container_mut().unwrap();
    let schema_id = container.add_schema("osi3.Lane", "protobuf", b"lane").unwrap();
    let channel_id = container
        .add_channel(schema_id, "lanes", "protobuf", &BTreeMap::new())
        .unwrap();
    container
        .write_to_known_channel(
            &mcap::records::MessageHeader {
                channel_id,
                sequence: 0,
                log_time: 0,
                publish_time: 0,
            },
            &[],
        )
        .unwrap();
    writer.close().unwrap();

    let mut reader = McapTraceFileReader::new();
    reader.open(&path).unwrap();
    assert!(reader.has_next());
    assert!(matches!(
        reader.read_message(),
        Err(TraceError::UnknownKind { .. })
    ));
    assert!(!reader.has_next());
    assert!(matches!(
        reader.read_message(),
        Err(TraceError::NoMoreMessages)
    ));
}

// ============================================================================
// Ordering and Filtering
// ============================================================================

#[test]
fn test_read_orders() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("order.mcap");
    write_two_topic_trace(&path);

    let seconds = |order: ReadOrder| -> Vec<i64> {
        let mut reader =
            McapTraceFileReader::with_options(McapReadOptions::default().with_order(order));
        reader.open(&path).unwrap();
        read_seconds(&mut reader).into_iter().map(|(_, s)| s).collect()
    };

    assert_eq!(seconds(ReadOrder::LogTime), vec![1, 2, 3, 4]);
    assert_eq!(seconds(ReadOrder::ReverseLogTime), vec![4, 3, 2, 1]);
    assert_eq!(seconds(ReadOrder::File), vec![3, 1, 2, 4]);
}

#[test]
fn test_topic_filters() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("filter.mcap");
    write_two_topic_trace(&path);

    let read = |filter: TopicFilter| -> Vec<(String, i64)> {
        let mut reader = McapTraceFileReader::new();
        reader
            .open_with_options(&path, McapReadOptions::default().with_topic_filter(filter))
            .unwrap();
        read_seconds(&mut reader)
    };

    assert_eq!(
        read(TopicFilter::include(["gt"])),
        vec![("gt".to_string(), 2), ("gt".to_string(), 3)]
    );
    assert_eq!(
        read(TopicFilter::exclude(["gt"])),
        vec![("sv".to_string(), 1), ("sv".to_string(), 4)]
    );
    assert_eq!(read(TopicFilter::regex_include("^s").unwrap()).len(), 2);
    assert_eq!(read(TopicFilter::custom(|t| t.len() == 2)).len(), 4);
}

#[test]
fn test_time_range_is_half_open() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("range.mcap");
    write_two_topic_trace(&path);

    let mut reader = McapTraceFileReader::with_options(
        McapReadOptions::default().with_time_range(Some(2_000_000_000), Some(4_000_000_000)),
    );
    reader.open(&path).unwrap();
    let seconds: Vec<i64> = read_seconds(&mut reader).into_iter().map(|(_, s)| s).collect();
    assert_eq!(seconds, vec![2, 3]);

    // Channel counts cover the whole file.
    let total: u64 = reader
        .channels()
        .unwrap()
        .values()
        .map(|c| c.message_count)
        .sum();
    assert_eq!(total, 4);
}

#[test]
fn test_remaining_counts_accepted_records_in_read_order() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("remaining.mcap");
    write_two_topic_trace(&path);

    for order in [ReadOrder::File, ReadOrder::LogTime, ReadOrder::ReverseLogTime] {
        let options = McapReadOptions::default()
            .with_order(order)
            .with_time_range(Some(2_000_000_000), None);
        let mut reader = McapTraceFileReader::with_options(options);
        reader.open(&path).unwrap();
        assert_eq!(reader.remaining(), 3, "{order:?}");

        let mut seconds = Vec::new();
        while reader.has_next() {
            let result = reader.read_message().unwrap();
            seconds.push(timestamp(&result.message).unwrap().0);
            assert_eq!(reader.remaining(), 3 - seconds.len(), "{order:?}");
        }
        let expected = match order {
            ReadOrder::File => vec![3, 2, 4],
            ReadOrder::LogTime => vec![2, 3, 4],
            ReadOrder::ReverseLogTime => vec![4, 3, 2],
        };
        assert_eq!(seconds, expected);
        assert!(matches!(
            reader.read_message(),
            Err(TraceError::NoMoreMessages)
        ));
    }
}

// ============================================================================
// Container Errors
// ============================================================================

#[test]
fn test_missing_required_metadata_is_reported() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("bare.mcap");
    let mut writer = McapTraceFileWriter::new();
    writer.open(&path).unwrap();
    writer.close().unwrap();

    let mut reader = McapTraceFileReader::new();
    reader.open(&path).unwrap();
    assert!(!reader.has_required_metadata());
    assert!(reader.file_metadata().is_empty());
    assert!(!reader.has_next());
}

#[test]
fn test_truncated_container() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("truncated.mcap");
    write_two_topic_trace(&path);

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let mut reader = McapTraceFileReader::new();
    match reader.open(&path) {
        Ok(()) => {
            let results: Vec<_> = reader.messages().collect();
            assert!(results.iter().any(|r| r.is_err()));
        }
        Err(e) => assert!(e.is_corruption(), "{e:?}"),
    }
}

#[test]
fn test_reopen_lifecycle() {
    let dir = temp_dir("mcap_reader");
    let path = dir.path("lifecycle.mcap");
    write_mixed_trace(&path);

    let mut reader = McapTraceFileReader::new();
    reader.open(&path).unwrap();
    assert!(matches!(
        reader.open(&path),
        Err(TraceError::AlreadyOpen { .. })
    ));
    reader.close();
    reader.close();
    assert!(!reader.is_open());
    assert!(reader.channels().is_none());
    assert!(matches!(
        reader.read_message(),
        Err(TraceError::NotOpen { .. })
    ));
    reader.open(&path).unwrap();
    assert!(reader.is_open());
}

// ============================================================================
// Format Dispatch
// ============================================================================

#[test]
fn test_open_reader_dispatches_on_extension() {
    let dir = temp_dir("mcap_reader");

    let osi = dir.path("dispatch_gt_.osi");
    write_ground_truth_trace(&osi, 2);
    let mut reader = open_reader(&osi, None, false).unwrap();
    assert_eq!(reader.messages().count(), 2);

    let mcap_path = dir.path("dispatch.mcap");
    write_mixed_trace(&mcap_path);
    let mut reader = open_reader(&mcap_path, None, true).unwrap();
    assert_eq!(reader.messages().count(), 2);

    assert!(matches!(
        open_reader(&dir.path("dispatch.json"), None, false),
        Err(TraceError::InvalidExtension { .. })
    ));
}

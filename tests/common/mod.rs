// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use prost_reflect::DynamicMessage;

use osi_trace::encoding::{new_message, set_timestamp};
use osi_trace::io::formats::mcap::McapTraceFileWriter;
use osi_trace::{BinaryTraceFileWriter, MessageKind, MessageWriter, TraceFileWriter};

// ============================================================================
// Temporary Directories
// ============================================================================

static NEXT_DIR: AtomicU32 = AtomicU32::new(0);

/// Cleanup guard for test temporary files.
/// Removes the directory, and everything in it, when dropped.
#[derive(Debug)]
pub struct CleanupGuard(PathBuf);

impl CleanupGuard {
    /// Path of `name` inside the guarded directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }

    pub fn dir(&self) -> &Path {
        &self.0
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Create a fresh temporary directory for one test.
///
/// Process id plus a counter keep parallel tests apart.
pub fn temp_dir(prefix: &str) -> CleanupGuard {
    let dir = std::env::temp_dir().join(format!(
        "osi_trace_{}_{}_{}",
        prefix,
        std::process::id(),
        NEXT_DIR.fetch_add(1, Ordering::Relaxed)
    ));
    fs::create_dir_all(&dir).unwrap();
    CleanupGuard(dir)
}

// ============================================================================
// Message Fixtures
// ============================================================================

/// A message of `kind` with its timestamp set.
pub fn stamped(kind: MessageKind, seconds: i64, nanos: u32) -> DynamicMessage {
    let mut msg = new_message(kind).unwrap();
    set_timestamp(&mut msg, seconds, nanos).unwrap();
    msg
}

/// A `GroundTruth` with its timestamp set.
pub fn ground_truth(seconds: i64, nanos: u32) -> DynamicMessage {
    stamped(MessageKind::GroundTruth, seconds, nanos)
}

/// Write `GroundTruth` messages stamped `0..count` seconds to a binary trace.
pub fn write_ground_truth_trace(path: &Path, count: i64) {
    let mut writer = BinaryTraceFileWriter::new();
    writer.open(path).unwrap();
    for i in 0..count {
        writer.write_message(&ground_truth(i, 0)).unwrap();
    }
    writer.close().unwrap();
}

/// An MCAP writer opened on `path` with the required metadata already added.
pub fn open_mcap_writer(path: &Path) -> McapTraceFileWriter {
    let mut writer = McapTraceFileWriter::new();
    writer.open(path).unwrap();
    writer
        .add_file_metadata(&McapTraceFileWriter::prepare_required_file_metadata())
        .unwrap();
    writer
}

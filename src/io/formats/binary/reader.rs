// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reader for length-framed binary traces.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::core::{MessageKind, Result, TraceError};
use crate::encoding::{global_registry, MessageCodec};
use crate::io::detection::{require_extension, resolve_kind};
use crate::io::metadata::ReadResult;
use crate::io::traits::TraceFileReader;

use super::{BINARY_EXTENSION, LENGTH_PREFIX_SIZE};

const CONTEXT: &str = "BinaryTraceFileReader";

struct OpenTrace {
    path: PathBuf,
    reader: BufReader<File>,
    file_len: u64,
    position: u64,
    codec: &'static MessageCodec,
}

/// Reads `[u32 LE length][payload]` records of a single message kind.
#[derive(Default)]
pub struct BinaryTraceFileReader {
    trace: Option<OpenTrace>,
}

impl BinaryTraceFileReader {
    /// Create an unopened reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path`, using `kind` or inferring it from the file name.
    pub fn open_with_kind(&mut self, path: &Path, kind: Option<MessageKind>) -> Result<()> {
        if self.trace.is_some() {
            return Err(TraceError::AlreadyOpen { context: CONTEXT });
        }
        require_extension(path, BINARY_EXTENSION)?;
        if !path.exists() {
            return Err(TraceError::not_found(path.display().to_string()));
        }
        let kind = resolve_kind(path, kind)?;
        let codec = global_registry()?.codec_for(kind)?;

        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        debug!(
            context = CONTEXT,
            path = %path.display(),
            kind = %kind,
            bytes = file_len,
            "Opened binary trace"
        );

        self.trace = Some(OpenTrace {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            file_len,
            position: 0,
            codec,
        });
        Ok(())
    }

    /// Kind of the open trace.
    pub fn kind(&self) -> Option<MessageKind> {
        self.trace.as_ref().map(|t| t.codec.kind())
    }

    /// Path of the open trace.
    pub fn path(&self) -> Option<&Path> {
        self.trace.as_ref().map(|t| t.path.as_path())
    }
}

impl OpenTrace {
    fn truncated(&mut self, offset: u64, expected: u64, available: u64) -> TraceError {
        // Nothing past a broken frame can be trusted.
        self.position = self.file_len;
        TraceError::TruncatedRecord {
            offset,
            expected,
            available,
        }
    }

    fn next_payload(&mut self) -> Result<Vec<u8>> {
        let offset = self.position;
        let remaining = self.file_len - offset;

        let prefix = LENGTH_PREFIX_SIZE as u64;
        if remaining < prefix {
            return Err(self.truncated(offset, prefix, remaining));
        }
        let declared = match self.reader.read_u32::<LittleEndian>() {
            Ok(len) => u64::from(len),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(self.truncated(offset, prefix, 0))
            }
            Err(e) => return Err(e.into()),
        };

        let available = remaining - prefix;
        if declared > available {
            return Err(self.truncated(offset, declared, available));
        }

        let mut payload = vec![0u8; declared as usize];
        if let Err(e) = self.reader.read_exact(&mut payload) {
            return Err(if e.kind() == ErrorKind::UnexpectedEof {
                self.truncated(offset, declared, available)
            } else {
                e.into()
            });
        }
        self.position = offset + prefix + declared;
        Ok(payload)
    }
}

impl TraceFileReader for BinaryTraceFileReader {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.open_with_kind(path, None)
    }

    fn has_next(&self) -> bool {
        self.trace
            .as_ref()
            .is_some_and(|t| t.position < t.file_len)
    }

    fn read_message(&mut self) -> Result<ReadResult> {
        let trace = self
            .trace
            .as_mut()
            .ok_or(TraceError::NotOpen { context: CONTEXT })?;
        if trace.position >= trace.file_len {
            return Err(TraceError::NoMoreMessages);
        }
        let payload = trace.next_payload()?;
        let message = trace.codec.decode(&payload)?;
        Ok(ReadResult::new(message, trace.codec.kind()))
    }

    fn close(&mut self) {
        if let Some(trace) = self.trace.take() {
            debug!(
                context = CONTEXT,
                path = %trace.path.display(),
                "Closed binary trace"
            );
        }
    }

    fn is_open(&self) -> bool {
        self.trace.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("osi_trace_bin_reader_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_open_rejects_wrong_extension() {
        let mut reader = BinaryTraceFileReader::new();
        let err = reader.open(Path::new("trace_gt_.bin")).unwrap_err();
        assert!(matches!(err, TraceError::InvalidExtension { .. }));
        assert!(!reader.is_open());
    }

    #[test]
    fn test_open_missing_file() {
        let mut reader = BinaryTraceFileReader::new();
        let err = reader.open(&temp_path("missing_gt_.osi")).unwrap_err();
        assert!(matches!(err, TraceError::NotFound { .. }));
    }

    #[test]
    fn test_read_before_open() {
        let mut reader = BinaryTraceFileReader::new();
        assert!(!reader.has_next());
        assert!(matches!(
            reader.read_message(),
            Err(TraceError::NotOpen { .. })
        ));
    }

    #[test]
    fn test_short_length_prefix_is_truncated() {
        let path = temp_path("short_gt_.osi");
        File::create(&path).unwrap().write_all(&[1, 0]).unwrap();

        let mut reader = BinaryTraceFileReader::new();
        reader.open(&path).unwrap();
        assert!(reader.has_next());
        let err = reader.read_message().unwrap_err();
        assert!(matches!(
            err,
            TraceError::TruncatedRecord {
                offset: 0,
                expected: 4,
                available: 2
            }
        ));
        assert!(!reader.has_next());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_zero_length_record_is_default_message() {
        let path = temp_path("zero_sv_.osi");
        File::create(&path).unwrap().write_all(&[0, 0, 0, 0]).unwrap();

        let mut reader = BinaryTraceFileReader::new();
        reader.open(&path).unwrap();
        assert_eq!(reader.kind(), Some(MessageKind::SensorView));
        let result = reader.read_message().unwrap();
        assert_eq!(result.kind, MessageKind::SensorView);
        assert!(result.channel_name.is_none());
        assert!(!reader.has_next());
        assert!(matches!(
            reader.read_message(),
            Err(TraceError::NoMoreMessages)
        ));

        std::fs::remove_file(&path).ok();
    }
}

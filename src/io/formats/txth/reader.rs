// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reader for delimited text traces.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::{MessageKind, Result, TraceError};
use crate::encoding::{global_registry, MessageCodec};
use crate::io::detection::{require_extension, resolve_kind};
use crate::io::metadata::ReadResult;
use crate::io::traits::TraceFileReader;

use super::TEXT_EXTENSION;

const CONTEXT: &str = "TxthTraceFileReader";

struct OpenTrace {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    delimiter: String,
    /// First line of the next block, already consumed from `lines`.
    pending: Option<String>,
    codec: &'static MessageCodec,
}

/// Reads text blocks separated by recurrences of the file's first line.
#[derive(Default)]
pub struct TxthTraceFileReader {
    trace: Option<OpenTrace>,
}

impl TxthTraceFileReader {
    /// Create an unopened reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path`, using `kind` or inferring it from the file name.
    pub fn open_with_kind(&mut self, path: &Path, kind: Option<MessageKind>) -> Result<()> {
        if self.trace.is_some() {
            return Err(TraceError::AlreadyOpen { context: CONTEXT });
        }
        require_extension(path, TEXT_EXTENSION)?;
        if !path.exists() {
            return Err(TraceError::not_found(path.display().to_string()));
        }
        let kind = resolve_kind(path, kind)?;
        let codec = global_registry()?.codec_for(kind)?;

        let mut lines = BufReader::new(File::open(path)?).lines();
        let pending = lines.next().transpose()?;
        let delimiter = pending.clone().unwrap_or_default();

        debug!(
            context = CONTEXT,
            path = %path.display(),
            kind = %kind,
            delimiter = %delimiter,
            "Opened text trace"
        );

        self.trace = Some(OpenTrace {
            path: path.to_path_buf(),
            lines,
            delimiter,
            pending,
            codec,
        });
        Ok(())
    }

    /// Kind of the open trace.
    pub fn kind(&self) -> Option<MessageKind> {
        self.trace.as_ref().map(|t| t.codec.kind())
    }

    /// Block delimiter line of the open trace.
    pub fn delimiter(&self) -> Option<&str> {
        self.trace.as_ref().map(|t| t.delimiter.as_str())
    }
}

impl OpenTrace {
    fn next_block(&mut self) -> Result<Option<String>> {
        let Some(first) = self.pending.take() else {
            return Ok(None);
        };
        let mut block = first;
        block.push('\n');

        for line in self.lines.by_ref() {
            let line = line?;
            if line == self.delimiter {
                self.pending = Some(line);
                break;
            }
            block.push_str(&line);
            block.push('\n');
        }
        Ok(Some(block))
    }
}

impl TraceFileReader for TxthTraceFileReader {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.open_with_kind(path, None)
    }

    fn has_next(&self) -> bool {
        self.trace.as_ref().is_some_and(|t| t.pending.is_some())
    }

    fn read_message(&mut self) -> Result<ReadResult> {
        let trace = self
            .trace
            .as_mut()
            .ok_or(TraceError::NotOpen { context: CONTEXT })?;
        let block = trace.next_block()?.ok_or(TraceError::NoMoreMessages)?;
        let message = trace.codec.decode_text(&block)?;
        Ok(ReadResult::new(message, trace.codec.kind()))
    }

    fn close(&mut self) {
        if let Some(trace) = self.trace.take() {
            debug!(context = CONTEXT, path = %trace.path.display(), "Closed text trace");
        }
    }

    fn is_open(&self) -> bool {
        self.trace.is_some()
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Writer for delimited text traces.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use prost_reflect::{DynamicMessage, ReflectMessage};
use tracing::{debug, warn};

use crate::core::{Result, TraceError};
use crate::encoding::global_registry;
use crate::io::detection::require_extension;
use crate::io::traits::{MessageWriter, TraceFileWriter};

use super::TEXT_EXTENSION;

const CONTEXT: &str = "TxthTraceFileWriter";

/// Appends each message's text rendering; no separator is written.
#[derive(Default)]
pub struct TxthTraceFileWriter {
    output: Option<(PathBuf, BufWriter<File>)>,
}

impl TxthTraceFileWriter {
    /// Create an unopened writer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceFileWriter for TxthTraceFileWriter {
    fn open(&mut self, path: &Path) -> Result<()> {
        if self.output.is_some() {
            return Err(TraceError::AlreadyOpen { context: CONTEXT });
        }
        require_extension(path, TEXT_EXTENSION)?;
        let file = File::create(path)?;
        debug!(context = CONTEXT, path = %path.display(), "Opened text trace for writing");
        self.output = Some((path.to_path_buf(), BufWriter::new(file)));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some((path, mut out)) = self.output.take() {
            out.flush()?;
            debug!(context = CONTEXT, path = %path.display(), "Closed text trace");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.output.is_some()
    }
}

impl MessageWriter for TxthTraceFileWriter {
    fn write_message(&mut self, message: &DynamicMessage) -> Result<()> {
        let (_, out) = self
            .output
            .as_mut()
            .ok_or(TraceError::NotOpen { context: CONTEXT })?;
        let registry = global_registry()?;
        let kind = registry.kind_for_type_name(message.descriptor().full_name())?;
        let text = registry.codec_for(kind)?.encode_text(message)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

impl Drop for TxthTraceFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(context = CONTEXT, error = %e, "Failed to flush text trace on drop");
        }
    }
}

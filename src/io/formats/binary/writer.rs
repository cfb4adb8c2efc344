// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Writer for length-framed binary traces.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use prost_reflect::{DynamicMessage, ReflectMessage};
use tracing::{debug, warn};

use crate::core::{Result, TraceError};
use crate::encoding::global_registry;
use crate::io::detection::require_extension;
use crate::io::traits::{MessageWriter, TraceFileWriter};

use super::BINARY_EXTENSION;

const CONTEXT: &str = "BinaryTraceFileWriter";

/// Appends `[u32 LE length][payload]` records.
#[derive(Default)]
pub struct BinaryTraceFileWriter {
    output: Option<(PathBuf, BufWriter<File>)>,
    messages_written: u64,
}

impl BinaryTraceFileWriter {
    /// Create an unopened writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages written since the last `open`.
    pub fn messages_written(&self) -> u64 {
        self.messages_written
    }
}

impl TraceFileWriter for BinaryTraceFileWriter {
    fn open(&mut self, path: &Path) -> Result<()> {
        if self.output.is_some() {
            return Err(TraceError::AlreadyOpen { context: CONTEXT });
        }
        require_extension(path, BINARY_EXTENSION)?;
        let file = File::create(path)?;
        debug!(context = CONTEXT, path = %path.display(), "Opened binary trace for writing");

        self.output = Some((path.to_path_buf(), BufWriter::new(file)));
        self.messages_written = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some((path, mut out)) = self.output.take() {
            out.flush()?;
            debug!(
                context = CONTEXT,
                path = %path.display(),
                messages = self.messages_written,
                "Closed binary trace"
            );
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.output.is_some()
    }
}

impl MessageWriter for BinaryTraceFileWriter {
    fn write_message(&mut self, message: &DynamicMessage) -> Result<()> {
        let (_, out) = self
            .output
            .as_mut()
            .ok_or(TraceError::NotOpen { context: CONTEXT })?;

        let registry = global_registry()?;
        let kind = registry.kind_for_type_name(message.descriptor().full_name())?;
        let payload = registry.codec_for(kind)?.encode(message)?;
        let len = u32::try_from(payload.len()).map_err(|_| {
            TraceError::serialization(
                kind.schema_name(),
                format!("payload of {} bytes exceeds the u32 frame limit", payload.len()),
            )
        })?;

        out.write_u32::<LittleEndian>(len)?;
        out.write_all(&payload)?;
        self.messages_written += 1;
        Ok(())
    }
}

impl Drop for BinaryTraceFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(context = CONTEXT, error = %e, "Failed to flush binary trace on drop");
        }
    }
}

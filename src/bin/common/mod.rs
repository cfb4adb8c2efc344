// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::collections::BTreeMap;
use std::io::IsTerminal as _;
use std::path::Path;

use anyhow::Context as _;
use clap::ValueEnum;
use osi_trace::io::formats::mcap::McapTraceFileReader;
use osi_trace::{open_reader, ChannelInfo, FileMetadata, MessageKind, TraceFileReader, TraceFormat};
use tracing::level_filters::LevelFilter;

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Log level accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Install the stderr subscriber. A second call is ignored.
pub fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Format a timestamp in nanoseconds to human-readable string.
pub fn format_timestamp(nanos: u64) -> String {
    let secs = nanos / 1_000_000_000;
    let subsec = (nanos % 1_000_000_000) as u32;
    let datetime = i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::<chrono::Utc>::from_timestamp(s, subsec));

    match datetime {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => format!("{} ns", nanos),
    }
}

/// Spinner-style progress for streams of unknown length.
pub struct ProgressBar {
    inner: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a new progress indicator; hidden when stderr is not a terminal.
    pub fn new(prefix: impl Into<String>) -> Self {
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new_spinner();
            if let Ok(style) = indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {prefix} {pos} messages {msg}")
            {
                pb.set_style(style);
            }
            pb.set_prefix(prefix.into());
            Some(pb)
        } else {
            None
        };

        Self { inner }
    }

    /// Advance by one message.
    pub fn inc(&self) {
        if let Some(pb) = &self.inner {
            pb.inc(1);
        }
    }

    /// Finish the progress bar with a message.
    pub fn finish_with_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.finish_with_message(msg);
        }
    }
}

/// An opened input trace plus what its container declares up front.
pub struct Input {
    pub reader: Box<dyn TraceFileReader>,
    pub format: TraceFormat,
    /// MCAP channels by id; empty for single-stream formats
    pub channels: BTreeMap<u16, ChannelInfo>,
    /// MCAP metadata records; empty for single-stream formats
    pub metadata: Vec<FileMetadata>,
}

/// Open a trace with format detection from the extension.
pub fn open_input(path: &Path, kind: Option<MessageKind>, skip_non_osi: bool) -> Result<Input> {
    let format = TraceFormat::from_path(path).with_context(|| {
        format!(
            "unsupported input extension: {} (expected .osi, .txth or .mcap)",
            path.display()
        )
    })?;

    if format != TraceFormat::Mcap {
        let reader = open_reader(path, kind, skip_non_osi)
            .with_context(|| format!("failed to open {}", path.display()))?;
        return Ok(Input {
            reader,
            format,
            channels: BTreeMap::new(),
            metadata: Vec::new(),
        });
    }

    let mut reader = McapTraceFileReader::new();
    reader.set_skip_non_osi_msgs(skip_non_osi);
    reader
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let channels = reader.channels().cloned().unwrap_or_default();
    let metadata = reader.file_metadata().to_vec();
    Ok(Input {
        reader: Box::new(reader),
        format,
        channels,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00.000 UTC");
        assert_eq!(
            format_timestamp(123_456_000_000),
            "1970-01-01 00:02:03.456 UTC"
        );
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Debug.as_filter(), LevelFilter::DEBUG);
        assert_eq!(LogLevel::Off.as_filter(), LevelFilter::OFF);
    }
}

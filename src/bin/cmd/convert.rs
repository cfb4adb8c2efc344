// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Convert command - copy OSI messages between trace formats.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _};
use chrono::SecondsFormat;
use clap::Args;
use tracing::{info, warn};

use crate::common::{open_input, Input, ProgressBar, Result};
use osi_trace::io::detection::timestamp_from_file_name;
use osi_trace::io::formats::mcap::{
    ContainerCompression, McapTraceFileWriter, McapWriterOptions, REQUIRED_METADATA_NAME,
};
use osi_trace::{
    BinaryTraceFileWriter, ChannelInfo, FileMetadata, MessageKind, MessageWriter, ReadResult,
    TraceError, TraceFileReader, TraceFileWriter, TraceFormat, TxthTraceFileWriter,
};

/// Topic used when neither `--topic` nor a source channel names one.
pub const DEFAULT_TOPIC: &str = "ConvertedTrace";

/// Metadata record carrying the recording time of converted traces.
pub const TIMING_METADATA_NAME: &str = "asam_osi";

/// Convert a trace to another container format.
///
/// The output format is taken from the OUTPUT extension.
#[derive(Args, Clone, Debug)]
pub struct ConvertCmd {
    /// Input trace (.osi, .txth or .mcap)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output trace (.osi, .txth or .mcap)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Message kind of a single-stream input (e.g. SensorView, sv)
    #[arg(long, value_name = "KIND")]
    input_type: Option<MessageKind>,

    /// MCAP output topic (defaults to the source channel or ConvertedTrace)
    #[arg(long)]
    topic: Option<String>,

    /// MCAP chunk compression: none, zstd or lz4
    #[arg(long)]
    compression: Option<ContainerCompression>,

    /// MCAP chunk size in bytes
    #[arg(long)]
    chunk_size: Option<u64>,

    /// TOML file with MCAP writer options
    #[arg(long, value_name = "FILE")]
    writer_config: Option<PathBuf>,

    /// Skip non-OSI records of an MCAP input instead of failing
    #[arg(long)]
    skip_non_osi: bool,
}

impl ConvertCmd {
    pub fn run(self) -> Result<()> {
        let output_format = TraceFormat::from_path(&self.output).ok_or_else(|| {
            anyhow!(
                "unsupported output extension: {} (expected .osi, .txth or .mcap)",
                self.output.display()
            )
        })?;

        let mut input = open_input(&self.input, self.input_type, self.skip_non_osi)?;
        println!("Converting {} to {}:", input.format, output_format);
        println!("  Input:  {}", self.input.display());
        println!("  Output: {}", self.output.display());

        let progress = ProgressBar::new("Converting");
        let written = match output_format {
            TraceFormat::Mcap => self.write_mcap(&mut input, &progress)?,
            TraceFormat::Binary => {
                copy_stream(BinaryTraceFileWriter::new(), &self.output, &mut input, &progress)?
            }
            TraceFormat::Text => {
                copy_stream(TxthTraceFileWriter::new(), &self.output, &mut input, &progress)?
            }
        };
        input.reader.close();

        progress.finish_with_message("done".to_string());
        println!("  Messages: {written}");
        println!("  Conversion complete!");
        Ok(())
    }

    fn writer_options(&self) -> Result<McapWriterOptions> {
        let mut options = match &self.writer_config {
            Some(path) => McapWriterOptions::load(path)
                .with_context(|| format!("failed to load writer config {}", path.display()))?,
            None => McapWriterOptions::default(),
        };
        if let Some(compression) = self.compression {
            options = options.with_compression(compression);
        }
        if let Some(chunk_size) = self.chunk_size {
            options = options.with_chunk_size(chunk_size);
        }
        Ok(options)
    }

    fn write_mcap(&self, input: &mut Input, progress: &ProgressBar) -> Result<u64> {
        let mut writer = McapTraceFileWriter::new();
        writer
            .open_with_options(&self.output, self.writer_options()?)
            .with_context(|| format!("failed to create {}", self.output.display()))?;

        let mut required = McapTraceFileWriter::prepare_required_file_metadata();
        required.insert("creation_time", McapTraceFileWriter::current_time_as_string());
        writer.add_file_metadata(&required)?;

        let mut has_timing = false;
        for record in &input.metadata {
            if record.name == REQUIRED_METADATA_NAME {
                continue;
            }
            match writer.add_file_metadata(record) {
                Ok(()) => has_timing |= record.name == TIMING_METADATA_NAME,
                Err(TraceError::DuplicateMetadata { name }) => {
                    warn!(name = %name, "Dropping repeated metadata record");
                }
                Err(e) => return Err(e.into()),
            }
        }
        if !has_timing {
            writer.add_file_metadata(&timing_metadata(&self.input))?;
        }

        let mut topics = TopicPlan::new(self.topic.clone());
        let mut bound = HashSet::new();
        let mut written = 0u64;
        for result in input.reader.messages() {
            let result = result?;
            let topic = topics.topic_for(&result);
            if bound.insert(topic.clone()) {
                let metadata = channel_metadata(&input.channels, &result);
                writer.add_channel_for_kind(&topic, result.kind, metadata)?;
                info!(topic = %topic, kind = %result.kind, "Bound output channel");
            }
            writer.write_message(&result.message, &topic)?;
            progress.inc();
            written += 1;
        }

        writer.close()?;
        Ok(written)
    }
}

/// Copy every message into a single-stream writer.
fn copy_stream<W: MessageWriter>(
    mut writer: W,
    output: &Path,
    input: &mut Input,
    progress: &ProgressBar,
) -> Result<u64> {
    writer
        .open(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let mut kinds = HashSet::new();
    let mut written = 0u64;
    for result in input.reader.messages() {
        let result = result?;
        if kinds.insert(result.kind) && kinds.len() > 1 {
            warn!(
                kind = %result.kind,
                "Input mixes message kinds; the output cannot be read back as one kind"
            );
        }
        writer.write_message(&result.message)?;
        progress.inc();
        written += 1;
    }

    writer.close()?;
    Ok(written)
}

/// `timestamp` and `zero_time` from the input file name, or now.
fn timing_metadata(input: &Path) -> FileMetadata {
    let timestamp = match timestamp_from_file_name(input) {
        Some(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => {
            warn!(
                path = %input.display(),
                "Input name has no YYYYMMDDTHHMMSSZ prefix, using the current time"
            );
            McapTraceFileWriter::current_time_as_string()
        }
    };
    FileMetadata::new(TIMING_METADATA_NAME)
        .with_entry("timestamp", timestamp.as_str())
        .with_entry("zero_time", timestamp.as_str())
}

/// Metadata of the source channel a message came from, if any.
fn channel_metadata(
    channels: &BTreeMap<u16, ChannelInfo>,
    result: &ReadResult,
) -> BTreeMap<String, String> {
    result
        .channel_name
        .as_deref()
        .and_then(|name| channels.values().find(|c| c.topic == name))
        .map(|c| c.metadata.clone())
        .unwrap_or_default()
}

/// Picks the output topic of each message.
///
/// Source channel names are kept unless a topic is forced. Otherwise the
/// first kind seen takes the base topic and later kinds get the base topic
/// suffixed with their abbreviation.
struct TopicPlan {
    forced: Option<String>,
    by_kind: BTreeMap<MessageKind, String>,
}

impl TopicPlan {
    fn new(forced: Option<String>) -> Self {
        Self {
            forced,
            by_kind: BTreeMap::new(),
        }
    }

    fn topic_for(&mut self, result: &ReadResult) -> String {
        if self.forced.is_none() {
            if let Some(channel) = &result.channel_name {
                return channel.clone();
            }
        }
        if let Some(topic) = self.by_kind.get(&result.kind) {
            return topic.clone();
        }
        let base = self.forced.as_deref().unwrap_or(DEFAULT_TOPIC);
        let topic = if self.by_kind.is_empty() {
            base.to_string()
        } else {
            format!("{base}_{}", result.kind.abbreviation())
        };
        self.by_kind.insert(result.kind, topic.clone());
        topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osi_trace::encoding::new_message;

    fn result(kind: MessageKind, channel: Option<&str>) -> ReadResult {
        let r = ReadResult::new(new_message(kind).unwrap(), kind);
        match channel {
            Some(c) => r.with_channel(c),
            None => r,
        }
    }

    #[test]
    fn test_topic_plan_defaults() {
        let mut plan = TopicPlan::new(None);
        assert_eq!(plan.topic_for(&result(MessageKind::SensorView, None)), "ConvertedTrace");
        assert_eq!(plan.topic_for(&result(MessageKind::SensorView, None)), "ConvertedTrace");
        assert_eq!(
            plan.topic_for(&result(MessageKind::GroundTruth, None)),
            "ConvertedTrace_gt"
        );
    }

    #[test]
    fn test_topic_plan_keeps_source_channel() {
        let mut plan = TopicPlan::new(None);
        assert_eq!(
            plan.topic_for(&result(MessageKind::GroundTruth, Some("gt"))),
            "gt"
        );

        let mut forced = TopicPlan::new(Some("out".to_string()));
        assert_eq!(
            forced.topic_for(&result(MessageKind::GroundTruth, Some("gt"))),
            "out"
        );
    }

    #[test]
    fn test_timing_metadata_from_name() {
        let md = timing_metadata(Path::new("20240131T120000Z_sv_370_3000_1_run.osi"));
        assert_eq!(md.name, TIMING_METADATA_NAME);
        assert_eq!(md.get("timestamp"), Some("2024-01-31T12:00:00Z"));
        assert_eq!(md.get("zero_time"), Some("2024-01-31T12:00:00Z"));
    }
}

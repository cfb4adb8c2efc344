// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Info command - summarize the contents of a trace.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::common::{format_timestamp, open_input, ProgressBar, Result};
use osi_trace::encoding::timestamp_nanos;
use osi_trace::io::formats::mcap::REQUIRED_METADATA_NAME;
use osi_trace::{ChannelInfo, FileMetadata, MessageKind, ReadResult, TraceFileReader, TraceFormat};

/// Show message counts, channels and metadata of a trace.
#[derive(Args, Clone, Debug)]
pub struct InfoCmd {
    /// Trace file (.osi, .txth or .mcap)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Message kind of a single-stream input (e.g. GroundTruth, gt)
    #[arg(long, value_name = "KIND")]
    input_type: Option<MessageKind>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

/// Everything `info` reports about one trace.
#[derive(Debug, Default, Serialize)]
pub struct TraceSummary {
    pub path: String,
    pub format: Option<TraceFormat>,
    pub messages: u64,
    /// Messages per kind, by type name
    pub kinds: BTreeMap<String, u64>,
    /// OSI messages read per topic (MCAP only)
    pub topics: BTreeMap<String, u64>,
    /// Earliest and latest message timestamp in nanoseconds
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub channels: Vec<ChannelInfo>,
    pub metadata: Vec<FileMetadata>,
    /// Whether the required `net.asam.osi.trace` record is present (MCAP only)
    pub has_required_metadata: Option<bool>,
}

impl TraceSummary {
    fn record(&mut self, result: &ReadResult) {
        self.messages += 1;
        *self.kinds.entry(result.kind.type_name().to_string()).or_default() += 1;
        if let Some(topic) = &result.channel_name {
            *self.topics.entry(topic.clone()).or_default() += 1;
        }

        let ts = timestamp_nanos(&result.message);
        self.start_time = Some(self.start_time.map_or(ts, |t| t.min(ts)));
        self.end_time = Some(self.end_time.map_or(ts, |t| t.max(ts)));
    }
}

impl InfoCmd {
    pub fn run(self) -> Result<()> {
        let mut input = open_input(&self.file, self.input_type, true)?;

        let mut summary = TraceSummary {
            path: self.file.display().to_string(),
            format: Some(input.format),
            ..TraceSummary::default()
        };
        if input.format == TraceFormat::Mcap {
            summary.has_required_metadata = Some(
                input
                    .metadata
                    .iter()
                    .any(|m| m.name == REQUIRED_METADATA_NAME),
            );
        }
        summary.channels = std::mem::take(&mut input.channels).into_values().collect();
        summary.metadata = std::mem::take(&mut input.metadata);

        let progress = ProgressBar::new("Reading");
        for result in input.reader.messages() {
            summary.record(&result?);
            progress.inc();
        }
        input.reader.close();
        progress.finish_with_message("done".to_string());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }
        Ok(())
    }
}

fn print_summary(summary: &TraceSummary) {
    println!("File:     {}", summary.path);
    if let Some(format) = summary.format {
        println!("Format:   {format}");
    }
    println!("Messages: {}", summary.messages);
    if let (Some(start), Some(end)) = (summary.start_time, summary.end_time) {
        println!("Start:    {}", format_timestamp(start));
        println!("End:      {}", format_timestamp(end));
    }

    if !summary.kinds.is_empty() {
        println!("\nKinds:");
        for (kind, count) in &summary.kinds {
            println!("  {kind:<24} {count}");
        }
    }

    if !summary.channels.is_empty() {
        println!("\nChannels:");
        for channel in &summary.channels {
            let read = summary.topics.get(&channel.topic).copied().unwrap_or(0);
            println!(
                "  [{}] {} ({}, {}) {} messages, {} OSI",
                channel.id,
                channel.topic,
                channel.schema_name,
                channel.message_encoding,
                channel.message_count,
                read
            );
            for (key, value) in &channel.metadata {
                println!("      {key} = {value}");
            }
        }
    }

    if let Some(present) = summary.has_required_metadata {
        println!(
            "\nRequired metadata: {}",
            if present { "present" } else { "missing" }
        );
    }
    for record in &summary.metadata {
        println!("\nMetadata '{}':", record.name);
        for (key, value) in &record.entries {
            println!("  {key} = {value}");
        }
    }
}

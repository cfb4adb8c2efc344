// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP reader for OSI traces.
//!
//! The container is memory-mapped and scanned once on open: channels come
//! from the summary section (or the records themselves when there is none)
//! and metadata records are collected. Message payloads are never copied
//! during the scan. File order walks the data section again as messages are
//! read; time orders keep a sorted index of record positions and fetch each
//! payload from the map on demand. Compressed chunks are decompressed one at
//! a time and cached while their messages are read.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use mcap::records::{op, Record, SchemaHeader};
use mcap::{McapError, McapResult};
use memmap2::Mmap;
use tracing::{debug, trace, warn};

use crate::core::{Result, TraceError};
use crate::encoding::global_registry;
use crate::io::metadata::{ChannelInfo, FileMetadata, ReadResult};
use crate::io::traits::TraceFileReader;

use super::constants::{MCAP_MAGIC, REQUIRED_METADATA_NAME};
use super::is_osi_schema;
use super::options::{McapReadOptions, ReadOrder};

const CONTEXT: &str = "McapTraceFileReader";

/// Opcode byte plus little-endian record length.
const RECORD_PREFIX_LEN: usize = 1 + 8;

/// Where a message record lives in the mapped file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordPosition {
    /// Offset of the top-level record: the message itself or its chunk.
    offset: usize,
    /// Index among the chunk's records, for messages inside a chunk.
    within: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    channel_id: u16,
    log_time: u64,
    position: RecordPosition,
}

enum ScanEvent {
    Schema(SchemaHeader),
    Channel(mcap::records::Channel),
    Metadata(FileMetadata),
    Message(IndexEntry),
}

impl ScanEvent {
    fn from_record(record: &Record<'_>, position: RecordPosition) -> Option<Self> {
        match record {
            Record::Schema { header, .. } => Some(Self::Schema(header.clone())),
            Record::Channel(channel) => Some(Self::Channel(channel.clone())),
            Record::Metadata(m) => Some(Self::Metadata(FileMetadata {
                name: m.name.clone(),
                entries: m.metadata.clone(),
            })),
            Record::Message { header, .. } => Some(Self::Message(IndexEntry {
                channel_id: header.channel_id,
                log_time: header.log_time,
                position,
            })),
            _ => None,
        }
    }
}

/// Decompressed records of the chunk most recently touched.
struct ChunkCache {
    offset: usize,
    records: Vec<Record<'static>>,
}

/// Split the top-level record at `offset` into opcode, body and end offset.
fn record_at(data: &[u8], offset: usize) -> McapResult<(u8, &[u8], usize)> {
    let body_start = offset
        .checked_add(RECORD_PREFIX_LEN)
        .filter(|end| *end <= data.len())
        .ok_or(McapError::UnexpectedEof)?;
    let opcode = data[offset];
    let len = LittleEndian::read_u64(&data[offset + 1..body_start]);
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| body_start.checked_add(len))
        .filter(|end| *end <= data.len())
        .ok_or(McapError::UnexpectedEof)?;
    Ok((opcode, &data[body_start..end], end))
}

fn load_chunk<'c>(
    cache: &'c mut Option<ChunkCache>,
    data: &[u8],
    offset: usize,
) -> McapResult<&'c [Record<'static>]> {
    if cache.as_ref().map_or(true, |c| c.offset != offset) {
        let (opcode, body, _) = record_at(data, offset)?;
        let Record::Chunk { header, data: compressed } = mcap::parse_record(opcode, body)? else {
            return Err(McapError::BadIndex);
        };
        let records = mcap::read::ChunkReader::new(header, &compressed)?
            .map(|r| r.map(Record::into_owned))
            .collect::<McapResult<Vec<_>>>()?;
        trace!(context = CONTEXT, offset, records = records.len(), "Loaded chunk");
        *cache = Some(ChunkCache { offset, records });
    }
    Ok(cache.as_ref().map_or(&[], |c| c.records.as_slice()))
}

/// Payload of the message at `position`, borrowed from the map or the cache.
fn payload<'a>(
    cache: &'a mut Option<ChunkCache>,
    data: &'a [u8],
    position: RecordPosition,
) -> McapResult<Cow<'a, [u8]>> {
    match position.within {
        Some(index) => match load_chunk(cache, data, position.offset)?.get(index) {
            Some(Record::Message { data, .. }) => Ok(Cow::Borrowed(data.as_ref())),
            _ => Err(McapError::BadIndex),
        },
        None => {
            let (opcode, body, _) = record_at(data, position.offset)?;
            match mcap::parse_record(opcode, body)? {
                Record::Message { data, .. } => Ok(data),
                _ => Err(McapError::BadIndex),
            }
        }
    }
}

/// Walks the data section record by record, descending into chunks.
#[derive(Debug, Clone, Copy)]
struct RecordScanner {
    offset: usize,
    /// Next record index while inside the chunk at `offset`.
    within: Option<usize>,
    /// Offset following the chunk at `offset`.
    after_chunk: usize,
    done: bool,
}

impl RecordScanner {
    fn new() -> Self {
        Self {
            offset: MCAP_MAGIC.len(),
            within: None,
            after_chunk: 0,
            done: false,
        }
    }

    /// Next event of interest, or `None` at the end of the data section.
    fn next_event(
        &mut self,
        data: &[u8],
        cache: &mut Option<ChunkCache>,
    ) -> McapResult<Option<ScanEvent>> {
        let result = self.advance(data, cache);
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn advance(
        &mut self,
        data: &[u8],
        cache: &mut Option<ChunkCache>,
    ) -> McapResult<Option<ScanEvent>> {
        while !self.done {
            if let Some(index) = self.within {
                let records = load_chunk(cache, data, self.offset)?;
                let Some(record) = records.get(index) else {
                    self.offset = self.after_chunk;
                    self.within = None;
                    continue;
                };
                self.within = Some(index + 1);
                let position = RecordPosition {
                    offset: self.offset,
                    within: Some(index),
                };
                if let Some(event) = ScanEvent::from_record(record, position) {
                    return Ok(Some(event));
                }
                continue;
            }

            let (opcode, body, end) = record_at(data, self.offset)?;
            match opcode {
                op::CHUNK => {
                    self.within = Some(0);
                    self.after_chunk = end;
                }
                op::DATA_END | op::FOOTER => return Ok(None),
                op::SCHEMA | op::CHANNEL | op::METADATA | op::MESSAGE => {
                    let record = mcap::parse_record(opcode, body)?;
                    let position = RecordPosition {
                        offset: self.offset,
                        within: None,
                    };
                    self.offset = end;
                    if let Some(event) = ScanEvent::from_record(&record, position) {
                        return Ok(Some(event));
                    }
                }
                _ => self.offset = end,
            }
        }
        Ok(None)
    }
}

/// Messages still to be read, in read order.
enum MessageQueue {
    /// File order: the data section is walked as messages are consumed.
    Stream(RecordScanner),
    /// Time order: positions sorted on open.
    Indexed(VecDeque<IndexEntry>),
}

struct OpenContainer {
    path: PathBuf,
    mmap: Mmap,
    options: McapReadOptions,
    channels: BTreeMap<u16, ChannelInfo>,
    metadata: Vec<FileMetadata>,
    queue: MessageQueue,
    chunk_cache: Option<ChunkCache>,
    /// Next entry, taken from the queue but not yet consumed.
    front: Option<IndexEntry>,
    /// Accepted messages not yet consumed.
    remaining: usize,
    /// Accepted messages on OSI channels not yet consumed.
    osi_remaining: usize,
    /// Stream error reached while scanning; reported once the queue drains.
    pending_error: Option<TraceError>,
}

impl OpenContainer {
    fn is_osi(&self, channel_id: u16) -> bool {
        self.channels
            .get(&channel_id)
            .is_some_and(|c| is_osi_schema(&c.schema_encoding, &c.schema_name))
    }

    fn accepts(&self, entry: &IndexEntry) -> bool {
        self.channels
            .get(&entry.channel_id)
            .is_some_and(|c| self.options.accepts(&c.topic, entry.log_time))
    }

    fn corrupt(&self, reason: impl Into<String>) -> TraceError {
        TraceError::corrupt(self.path.display().to_string(), reason)
    }

    /// Next accepted entry without consuming it.
    fn peek(&mut self) -> Result<Option<IndexEntry>> {
        if self.front.is_none() {
            self.front = if let MessageQueue::Indexed(entries) = &mut self.queue {
                entries.pop_front()
            } else {
                self.next_streamed()?
            };
        }
        Ok(self.front)
    }

    fn next_streamed(&mut self) -> Result<Option<IndexEntry>> {
        loop {
            let MessageQueue::Stream(scanner) = &mut self.queue else {
                return Ok(None);
            };
            match scanner.next_event(&self.mmap, &mut self.chunk_cache) {
                Ok(Some(ScanEvent::Message(entry))) => {
                    // The open scan stopped here too.
                    if !self.channels.contains_key(&entry.channel_id) {
                        return Ok(None);
                    }
                    if self.accepts(&entry) {
                        return Ok(Some(entry));
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) => return Ok(None),
                // Already recorded by the open scan.
                Err(_) if self.pending_error.is_some() => return Ok(None),
                Err(e) => return Err(self.corrupt(e.to_string())),
            }
        }
    }

    fn consume(&mut self) {
        if let Some(entry) = self.front.take() {
            self.remaining = self.remaining.saturating_sub(1);
            if self.is_osi(entry.channel_id) {
                self.osi_remaining = self.osi_remaining.saturating_sub(1);
            }
        }
    }
}

/// Reads OSI messages from an MCAP container.
#[derive(Default)]
pub struct McapTraceFileReader {
    container: Option<OpenContainer>,
    options: McapReadOptions,
    skip_non_osi_msgs: bool,
}

fn channel_info(channel: &mcap::Channel<'_>) -> ChannelInfo {
    let schema = channel.schema.as_ref();
    ChannelInfo::new(
        channel.id,
        channel.topic.clone(),
        schema.map(|s| s.name.clone()).unwrap_or_default(),
    )
    .with_encodings(
        schema.map(|s| s.encoding.clone()).unwrap_or_default(),
        channel.message_encoding.clone(),
    )
    .with_metadata(channel.metadata.clone())
}

fn scanned_channel_info(
    channel: &mcap::records::Channel,
    schemas: &HashMap<u16, SchemaHeader>,
) -> ChannelInfo {
    let schema = schemas.get(&channel.schema_id);
    ChannelInfo::new(
        channel.id,
        channel.topic.clone(),
        schema.map(|s| s.name.clone()).unwrap_or_default(),
    )
    .with_encodings(
        schema.map(|s| s.encoding.clone()).unwrap_or_default(),
        channel.message_encoding.clone(),
    )
    .with_metadata(channel.metadata.clone())
}

impl McapTraceFileReader {
    /// Create an unopened reader with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unopened reader with the given options.
    pub fn with_options(options: McapReadOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Skip records that are not protobuf OSI messages instead of failing.
    pub fn set_skip_non_osi_msgs(&mut self, skip: bool) {
        self.skip_non_osi_msgs = skip;
    }

    /// Open `path` with explicit options, replacing the stored ones.
    pub fn open_with_options(&mut self, path: &Path, options: McapReadOptions) -> Result<()> {
        if self.container.is_some() {
            return Err(TraceError::AlreadyOpen { context: CONTEXT });
        }
        if !path.exists() {
            return Err(TraceError::not_found(path.display().to_string()));
        }
        self.options = options;

        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file) }?;
        let path_str = path.display().to_string();

        if mmap.len() < MCAP_MAGIC.len() || mmap[..MCAP_MAGIC.len()] != MCAP_MAGIC {
            return Err(TraceError::corrupt(&path_str, "missing MCAP magic"));
        }

        let mut channels = BTreeMap::new();
        match mcap::Summary::read(&mmap) {
            Ok(Some(summary)) => {
                for (id, channel) in &summary.channels {
                    channels.insert(*id, channel_info(channel));
                }
            }
            Ok(None) => {
                warn!(
                    context = CONTEXT,
                    path = %path_str,
                    "MCAP file has no summary section, scanning for channels"
                );
            }
            Err(e) => {
                return Err(TraceError::corrupt(
                    &path_str,
                    format!("failed to read summary: {e}"),
                ))
            }
        }

        let queue = match self.options.order {
            ReadOrder::File => MessageQueue::Stream(RecordScanner::new()),
            ReadOrder::LogTime | ReadOrder::ReverseLogTime => {
                MessageQueue::Indexed(VecDeque::new())
            }
        };
        let mut container = OpenContainer {
            path: path.to_path_buf(),
            mmap,
            options: self.options.clone(),
            channels,
            metadata: Vec::new(),
            queue,
            chunk_cache: None,
            front: None,
            remaining: 0,
            osi_remaining: 0,
            pending_error: None,
        };
        index_container(&mut container);

        debug!(
            context = CONTEXT,
            path = %path_str,
            channels = container.channels.len(),
            records = container.remaining,
            osi_records = container.osi_remaining,
            "Opened MCAP trace"
        );

        self.container = Some(container);
        Ok(())
    }

    /// Channels of the open file, by id.
    pub fn channels(&self) -> Option<&BTreeMap<u16, ChannelInfo>> {
        self.container.as_ref().map(|c| &c.channels)
    }

    /// Metadata records of the open file, in file order.
    pub fn file_metadata(&self) -> &[FileMetadata] {
        self.container.as_ref().map_or(&[], |c| c.metadata.as_slice())
    }

    /// Whether the open file carries the required trace metadata.
    pub fn has_required_metadata(&self) -> bool {
        self.file_metadata()
            .iter()
            .any(|m| m.name == REQUIRED_METADATA_NAME)
    }

    /// Accepted records not yet read, OSI or not.
    pub fn remaining(&self) -> usize {
        self.container.as_ref().map_or(0, |c| c.remaining)
    }
}

/// Scan the data section once: channels, metadata, message counts, and
/// for time orders the sorted message positions.
fn index_container(container: &mut OpenContainer) {
    let mut scanner = RecordScanner::new();
    let mut cache = None;
    let mut schemas = HashMap::new();
    let mut indexed = Vec::new();

    loop {
        let event = match scanner.next_event(&container.mmap, &mut cache) {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(e) => {
                warn!(
                    context = CONTEXT,
                    path = %container.path.display(),
                    error = %e,
                    indexed = container.remaining,
                    "Stopped indexing at unreadable record"
                );
                container.pending_error = Some(container.corrupt(e.to_string()));
                break;
            }
        };

        match event {
            ScanEvent::Schema(header) => {
                schemas.insert(header.id, header);
            }
            ScanEvent::Channel(channel) => {
                container
                    .channels
                    .entry(channel.id)
                    .or_insert_with(|| scanned_channel_info(&channel, &schemas));
            }
            ScanEvent::Metadata(metadata) => container.metadata.push(metadata),
            ScanEvent::Message(entry) => {
                let Some(info) = container.channels.get_mut(&entry.channel_id) else {
                    let reason = format!("message on undeclared channel {}", entry.channel_id);
                    container.pending_error = Some(container.corrupt(reason));
                    break;
                };
                info.message_count += 1;

                if container.accepts(&entry) {
                    container.remaining += 1;
                    if container.is_osi(entry.channel_id) {
                        container.osi_remaining += 1;
                    }
                    if matches!(container.queue, MessageQueue::Indexed(_)) {
                        indexed.push(entry);
                    }
                }
            }
        }
    }

    match container.options.order {
        ReadOrder::File => {}
        ReadOrder::LogTime => indexed.sort_by_key(|e| e.log_time),
        ReadOrder::ReverseLogTime => indexed.sort_by(|a, b| b.log_time.cmp(&a.log_time)),
    }
    if let MessageQueue::Indexed(entries) = &mut container.queue {
        entries.extend(indexed);
    }
}

impl TraceFileReader for McapTraceFileReader {
    fn open(&mut self, path: &Path) -> Result<()> {
        let options = self.options.clone();
        self.open_with_options(path, options)
    }

    fn has_next(&self) -> bool {
        self.container.as_ref().is_some_and(|c| {
            c.pending_error.is_some()
                || if self.skip_non_osi_msgs {
                    c.osi_remaining > 0
                } else {
                    c.remaining > 0
                }
        })
    }

    fn read_message(&mut self) -> Result<ReadResult> {
        let skip = self.skip_non_osi_msgs;
        let container = self
            .container
            .as_mut()
            .ok_or(TraceError::NotOpen { context: CONTEXT })?;

        loop {
            let Some(entry) = container.peek()? else {
                return Err(container
                    .pending_error
                    .take()
                    .unwrap_or(TraceError::NoMoreMessages));
            };
            let channel_id = entry.channel_id;
            let Some(channel) = container.channels.get(&channel_id) else {
                let reason = format!("message on undeclared channel {channel_id}");
                return Err(container.corrupt(reason));
            };

            if !is_osi_schema(&channel.schema_encoding, &channel.schema_name) {
                if skip {
                    trace!(
                        context = CONTEXT,
                        topic = %channel.topic,
                        schema = %channel.schema_name,
                        "Skipping non-OSI message"
                    );
                    container.consume();
                    continue;
                }
                return Err(TraceError::UnsupportedEncoding {
                    topic: channel.topic.clone(),
                    schema: channel.schema_name.clone(),
                    encoding: channel.schema_encoding.clone(),
                });
            }

            let topic = channel.topic.clone();
            let schema_name = channel.schema_name.clone();
            container.consume();

            let registry = global_registry()?;
            let kind = registry.kind_for_type_name(&schema_name)?;
            let data = payload(&mut container.chunk_cache, &container.mmap, entry.position)
                .map_err(|e| {
                    TraceError::corrupt(container.path.display().to_string(), e.to_string())
                })?;
            let message = registry.codec_for(kind)?.decode(&data)?;
            return Ok(ReadResult::new(message, kind).with_channel(topic));
        }
    }

    fn close(&mut self) {
        if let Some(container) = self.container.take() {
            debug!(context = CONTEXT, path = %container.path.display(), "Closed MCAP trace");
        }
    }

    fn is_open(&self) -> bool {
        self.container.is_some()
    }
}

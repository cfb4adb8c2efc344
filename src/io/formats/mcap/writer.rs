// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP writer for OSI traces.
//!
//! Wraps [`mcap::Writer`] with the OSI trace rules:
//! - the `net.asam.osi.trace` metadata record must be written before any message,
//! - each metadata name is written once,
//! - a topic is bound to one schema for the lifetime of the file,
//! - identical schemas are stored once and shared between channels.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use osi_trace::io::formats::mcap::McapTraceFileWriter;
//! use osi_trace::io::traits::TraceFileWriter;
//! use osi_trace::encoding::{global_registry, new_message};
//! use osi_trace::MessageKind;
//!
//! let mut writer = McapTraceFileWriter::new();
//! writer.open("trace.mcap".as_ref())?;
//! writer.add_file_metadata(&McapTraceFileWriter::prepare_required_file_metadata())?;
//!
//! let schema = global_registry()?.descriptor_for(MessageKind::GroundTruth)?;
//! writer.add_channel("gt", schema, BTreeMap::new())?;
//! writer.write_message(&new_message(MessageKind::GroundTruth)?, "gt")?;
//! writer.close()?;
//! # Ok::<(), osi_trace::TraceError>(())
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use prost::Message;
use prost_reflect::{DynamicMessage, ReflectMessage};
use tracing::{debug, warn};

use crate::core::{MessageKind, Result, TraceError};
use crate::encoding::{global_registry, timestamp_nanos};
use crate::io::metadata::FileMetadata;
use crate::io::traits::TraceFileWriter;
use crate::schema::{osi_version_string, SchemaDescriptor};

use super::constants::{
    CHANNEL_OSI_VERSION_KEY, CHANNEL_PROTOBUF_VERSION_KEY, MESSAGE_ENCODING, PROTOBUF_VERSION,
    REQUIRED_METADATA_KEYS, REQUIRED_METADATA_NAME,
};
use super::options::McapWriterOptions;

const CONTEXT: &str = "McapTraceFileWriter";

/// Underlying container type.
pub type McapContainer = mcap::Writer<BufWriter<File>>;

struct Channel {
    id: u16,
    schema: SchemaDescriptor,
    next_sequence: u32,
}

struct Session {
    path: PathBuf,
    /// `None` once the container has been finalized.
    container: Option<McapContainer>,
    schemas: Vec<(u16, SchemaDescriptor)>,
    channels: HashMap<String, Channel>,
    metadata_names: HashSet<String>,
    required_metadata_added: bool,
    messages_written: u64,
}

impl Session {
    fn container(&mut self) -> Result<&mut McapContainer> {
        self.container
            .as_mut()
            .ok_or_else(|| TraceError::container("container has been terminated"))
    }

    fn schema_id(&mut self, schema: &SchemaDescriptor) -> Result<u16> {
        if let Some((id, _)) = self.schemas.iter().find(|(_, s)| s.same_schema(schema)) {
            return Ok(*id);
        }
        let id = self
            .container()?
            .add_schema(schema.name(), schema.encoding(), schema.data())
            .map_err(TraceError::container)?;
        self.schemas.push((id, schema.clone()));
        Ok(id)
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut container) = self.container.take() {
            container.finish().map(|_| ()).map_err(TraceError::container)?;
            debug!(
                context = CONTEXT,
                path = %self.path.display(),
                channels = self.channels.len(),
                messages = self.messages_written,
                "Finalized MCAP container"
            );
        }
        Ok(())
    }
}

/// Writes OSI messages into named channels of an MCAP container.
#[derive(Default)]
pub struct McapTraceFileWriter {
    session: Option<Session>,
    options: McapWriterOptions,
}

impl McapTraceFileWriter {
    /// Create an unopened writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unopened writer with the given options.
    pub fn with_options(options: McapWriterOptions) -> Self {
        Self {
            session: None,
            options,
        }
    }

    /// Options used by the next `open`.
    pub fn options(&self) -> &McapWriterOptions {
        &self.options
    }

    /// Open `path` with explicit options, replacing the stored ones.
    pub fn open_with_options(&mut self, path: &Path, options: McapWriterOptions) -> Result<()> {
        if self.session.is_some() {
            return Err(TraceError::AlreadyOpen { context: CONTEXT });
        }
        self.options = options;

        let file = File::create(path)?;
        let container = self
            .options
            .to_write_options()
            .create(BufWriter::new(file))
            .map_err(TraceError::container)?;

        debug!(
            context = CONTEXT,
            path = %path.display(),
            compression = %self.options.compression,
            chunk_size = self.options.chunk_size,
            "Opened MCAP trace for writing"
        );

        self.session = Some(Session {
            path: path.to_path_buf(),
            container: Some(container),
            schemas: Vec::new(),
            channels: HashMap::new(),
            metadata_names: HashSet::new(),
            required_metadata_added: false,
            messages_written: 0,
        });
        Ok(())
    }

    fn session(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or(TraceError::NotOpen { context: CONTEXT })
    }

    /// Required trace metadata filled with this library's versions.
    pub fn prepare_required_file_metadata() -> FileMetadata {
        let osi_version = osi_version_string();
        FileMetadata::new(REQUIRED_METADATA_NAME)
            .with_entry("version", osi_version.as_str())
            .with_entry("min_osi_version", osi_version.as_str())
            .with_entry("max_osi_version", osi_version.as_str())
            .with_entry("min_protobuf_version", PROTOBUF_VERSION)
            .with_entry("max_protobuf_version", PROTOBUF_VERSION)
    }

    /// Current UTC time as ISO 8601, e.g. `2024-01-31T12:00:00Z`.
    pub fn current_time_as_string() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Write a metadata record.
    pub fn add_file_metadata(&mut self, metadata: &FileMetadata) -> Result<()> {
        let session = self.session()?;
        if session.metadata_names.contains(&metadata.name) {
            return Err(TraceError::DuplicateMetadata {
                name: metadata.name.clone(),
            });
        }
        let is_required = metadata.name == REQUIRED_METADATA_NAME;
        if is_required {
            let missing: Vec<&str> = REQUIRED_METADATA_KEYS
                .iter()
                .copied()
                .filter(|key| !metadata.entries.contains_key(*key))
                .collect();
            if !missing.is_empty() {
                return Err(TraceError::missing_metadata(
                    REQUIRED_METADATA_NAME,
                    format!("missing keys: {}", missing.join(", ")),
                ));
            }
        }

        let record = mcap::records::Metadata {
            name: metadata.name.clone(),
            metadata: metadata.entries.clone(),
        };
        session
            .container()?
            .write_metadata(&record)
            .map_err(TraceError::container)?;

        session.metadata_names.insert(metadata.name.clone());
        if is_required {
            session.required_metadata_added = true;
        }
        Ok(())
    }

    /// Bind `topic` to `schema`, returning the channel id.
    ///
    /// Re-adding a topic with the same schema returns the existing id.
    /// OSI version keys are added to `metadata` when absent.
    pub fn add_channel(
        &mut self,
        topic: &str,
        schema: &SchemaDescriptor,
        mut metadata: BTreeMap<String, String>,
    ) -> Result<u16> {
        let session = self.session()?;
        if topic.is_empty() {
            return Err(TraceError::EmptyTopic);
        }
        if let Some(channel) = session.channels.get(topic) {
            if channel.schema.same_schema(schema) {
                return Ok(channel.id);
            }
            return Err(TraceError::SchemaConflict {
                topic: topic.to_string(),
                existing: channel.schema.name().to_string(),
                requested: schema.name().to_string(),
            });
        }

        let schema_id = session.schema_id(schema)?;
        metadata
            .entry(CHANNEL_OSI_VERSION_KEY.to_string())
            .or_insert_with(osi_version_string);
        metadata
            .entry(CHANNEL_PROTOBUF_VERSION_KEY.to_string())
            .or_insert_with(|| PROTOBUF_VERSION.to_string());

        let id = session
            .container()?
            .add_channel(schema_id, topic, MESSAGE_ENCODING, &metadata)
            .map_err(TraceError::container)?;

        debug!(
            context = CONTEXT,
            topic,
            schema = schema.name(),
            channel_id = id,
            "Added channel"
        );
        session.channels.insert(
            topic.to_string(),
            Channel {
                id,
                schema: schema.clone(),
                next_sequence: 0,
            },
        );
        Ok(id)
    }

    /// Bind `topic` to the registered schema of `kind`.
    pub fn add_channel_for_kind(
        &mut self,
        topic: &str,
        kind: MessageKind,
        metadata: BTreeMap<String, String>,
    ) -> Result<u16> {
        let schema = global_registry()?.descriptor_for(kind)?;
        self.add_channel(topic, schema, metadata)
    }

    /// Append `message` to the channel bound to `topic`.
    ///
    /// Log and publish time are taken from the message timestamp.
    pub fn write_message(&mut self, message: &DynamicMessage, topic: &str) -> Result<()> {
        let session = self.session()?;
        if topic.is_empty() {
            return Err(TraceError::EmptyTopic);
        }
        let Some(channel) = session.channels.get(topic) else {
            return Err(TraceError::UnknownTopic {
                topic: topic.to_string(),
            });
        };
        if !session.required_metadata_added {
            return Err(TraceError::missing_metadata(
                REQUIRED_METADATA_NAME,
                "must be added before the first message",
            ));
        }
        let descriptor = message.descriptor();
        if descriptor.full_name() != channel.schema.name() {
            return Err(TraceError::SchemaConflict {
                topic: topic.to_string(),
                existing: channel.schema.name().to_string(),
                requested: descriptor.full_name().to_string(),
            });
        }

        let log_time = timestamp_nanos(message);
        let header = mcap::records::MessageHeader {
            channel_id: channel.id,
            sequence: channel.next_sequence,
            log_time,
            publish_time: log_time,
        };
        let data = message.encode_to_vec();

        session
            .container()?
            .write_to_known_channel(&header, &data)
            .map_err(TraceError::container)?;

        if let Some(channel) = session.channels.get_mut(topic) {
            channel.next_sequence = channel.next_sequence.wrapping_add(1);
        }
        session.messages_written += 1;
        Ok(())
    }

    /// Finalize the container while keeping the session open.
    ///
    /// Later metadata, channel, and message writes fail with
    /// [`TraceError::ContainerWrite`].
    pub fn terminate(&mut self) -> Result<()> {
        self.session()?.finish()
    }

    /// Raw access to the container, e.g. for non-OSI channels.
    ///
    /// `None` when closed or terminated.
    pub fn container_mut(&mut self) -> Option<&mut McapContainer> {
        self.session.as_mut()?.container.as_mut()
    }

    /// Messages written through [`Self::write_message`] since `open`.
    pub fn messages_written(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.messages_written)
    }
}

impl TraceFileWriter for McapTraceFileWriter {
    fn open(&mut self, path: &Path) -> Result<()> {
        let options = self.options.clone();
        self.open_with_options(path, options)
    }

    fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(mut session) => session.finish(),
            None => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for McapTraceFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(context = CONTEXT, error = %e, "Failed to finalize MCAP trace on drop");
        }
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message registry mapping each [`MessageKind`] to its schema and codec.
//!
//! The registry is built once from the bundled `osi3` descriptor pool and
//! never changes afterwards, so it can be shared freely across threads.
//!
//! # Example
//!
//! ```no_run
//! use osi_trace::encoding::global_registry;
//! use osi_trace::MessageKind;
//!
//! let registry = global_registry()?;
//! let schema = registry.descriptor_for(MessageKind::GroundTruth)?;
//! assert_eq!(schema.name(), "osi3.GroundTruth");
//! # Ok::<(), osi_trace::TraceError>(())
//! ```

use std::collections::BTreeMap;
use std::sync::OnceLock;

use prost_reflect::{DescriptorPool, DynamicMessage};

use crate::core::{MessageKind, Result, TraceError};
use crate::schema::{descriptor_pool, SchemaDescriptor};

use super::codec::MessageCodec;

struct Entry {
    schema: SchemaDescriptor,
    codec: MessageCodec,
}

/// Lookup tables for the closed set of OSI message kinds.
pub struct MessageRegistry {
    pool: DescriptorPool,
    entries: BTreeMap<MessageKind, Entry>,
}

impl MessageRegistry {
    /// Build the registry from the bundled schema.
    pub fn new() -> Result<Self> {
        let pool = descriptor_pool()?;
        let mut entries = BTreeMap::new();
        for kind in MessageKind::ALL {
            let name = kind.schema_name();
            let message = pool
                .get_message_by_name(&name)
                .ok_or_else(|| TraceError::invalid_schema(&name, "message type not in pool"))?;
            entries.insert(
                kind,
                Entry {
                    schema: SchemaDescriptor::from_message(message.clone()),
                    codec: MessageCodec::new(kind, message),
                },
            );
        }
        Ok(Self { pool, entries })
    }

    fn entry(&self, kind: MessageKind) -> Result<&Entry> {
        self.entries
            .get(&kind)
            .ok_or_else(|| TraceError::unknown_kind(kind.type_name()))
    }

    /// Schema handle for `kind`.
    pub fn descriptor_for(&self, kind: MessageKind) -> Result<&SchemaDescriptor> {
        Ok(&self.entry(kind)?.schema)
    }

    /// Codec for `kind`.
    pub fn codec_for(&self, kind: MessageKind) -> Result<&MessageCodec> {
        Ok(&self.entry(kind)?.codec)
    }

    /// Wire-format parser for `kind`.
    pub fn parser_for(
        &self,
        kind: MessageKind,
    ) -> Result<impl Fn(&[u8]) -> Result<DynamicMessage> + '_> {
        let codec = self.codec_for(kind)?;
        Ok(move |bytes: &[u8]| codec.decode(bytes))
    }

    /// Wire-format serializer for `kind`.
    pub fn serializer_for(
        &self,
        kind: MessageKind,
    ) -> Result<impl Fn(&DynamicMessage) -> Result<Vec<u8>> + '_> {
        let codec = self.codec_for(kind)?;
        Ok(move |message: &DynamicMessage| codec.encode(message))
    }

    /// Resolve a fully qualified type name such as `osi3.SensorView`.
    pub fn kind_for_type_name(&self, name: &str) -> Result<MessageKind> {
        MessageKind::from_schema_name(name)
            .filter(|kind| self.entries.contains_key(kind))
            .ok_or_else(|| TraceError::unknown_kind(name))
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = MessageKind> + '_ {
        self.entries.keys().copied()
    }

    /// Descriptor pool holding every bundled `osi3` type.
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

static GLOBAL_REGISTRY: OnceLock<Result<MessageRegistry>> = OnceLock::new();

/// Get the process-wide registry, building it on first use.
pub fn global_registry() -> Result<&'static MessageRegistry> {
    match GLOBAL_REGISTRY.get_or_init(MessageRegistry::new) {
        Ok(registry) => Ok(registry),
        Err(e) => Err(e.clone()),
    }
}

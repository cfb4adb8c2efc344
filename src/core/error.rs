// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Error types for trace-file I/O.
//!
//! Errors fall into two classes:
//! - Precondition failures (wrong state, bad path, unknown topic): the
//!   session is unaffected and the caller may continue.
//! - Corruption (truncated records, broken containers, undecodable
//!   payloads): the stream cannot be read past this point.
//!
//! [`TraceError::is_corruption`] tells the two apart.

use thiserror::Error;

/// Errors that can occur while reading or writing trace files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// The input file does not exist
    #[error("File not found: '{path}'")]
    NotFound {
        /// Path that was looked up
        path: String,
    },

    /// The file extension does not match the container format
    #[error("Invalid extension for '{path}': expected '.{expected}'")]
    InvalidExtension {
        /// Offending path
        path: String,
        /// Extension required by the format (without the dot)
        expected: &'static str,
    },

    /// `open` called on a session that is already open
    #[error("{context}: a file is already open")]
    AlreadyOpen {
        /// Reader or writer that rejected the call
        context: &'static str,
    },

    /// Operation requires an open session
    #[error("{context}: no file is open")]
    NotOpen {
        /// Reader or writer that rejected the call
        context: &'static str,
    },

    /// The reader has no further messages
    #[error("No more messages")]
    NoMoreMessages,

    /// Container structure could not be read
    #[error("Corrupt container '{path}': {reason}")]
    CorruptContainer {
        /// Container path
        path: String,
        /// What failed
        reason: String,
    },

    /// A record is not a protobuf-encoded OSI message
    #[error("Unsupported message on topic '{topic}': schema '{schema}' with encoding '{encoding}'")]
    UnsupportedEncoding {
        /// Channel topic of the record
        topic: String,
        /// Schema name of the record (empty when schemaless)
        schema: String,
        /// Schema encoding of the record
        encoding: String,
    },

    /// The message kind or type name has no registered mapping
    #[error("Unknown message kind: '{name}'")]
    UnknownKind {
        /// Name that failed to resolve
        name: String,
    },

    /// The message kind could not be inferred from the file name
    #[error("Cannot infer message kind from file name '{path}'")]
    AmbiguousKind {
        /// Path whose file name was inspected
        path: String,
    },

    /// A record ended before its declared length
    #[error("Truncated record at offset {offset}: expected {expected} bytes, {available} available")]
    TruncatedRecord {
        /// Byte offset of the record within the file
        offset: u64,
        /// Bytes the record header declared
        expected: u64,
        /// Bytes actually available
        available: u64,
    },

    /// A payload could not be parsed as its message kind
    #[error("Failed to deserialize {type_name}: {message}")]
    DeserializationFailed {
        /// Fully qualified message type
        type_name: String,
        /// Parser message
        message: String,
    },

    /// A message could not be rendered for output
    #[error("Failed to serialize {type_name}: {message}")]
    SerializationFailed {
        /// Fully qualified message type
        type_name: String,
        /// Serializer message
        message: String,
    },

    /// A metadata record with this name was already written
    #[error("Metadata '{name}' was already added")]
    DuplicateMetadata {
        /// Metadata record name
        name: String,
    },

    /// The required trace metadata is absent or incomplete
    #[error("Required metadata '{name}' is missing or incomplete: {reason}")]
    MissingRequiredMetadata {
        /// Required metadata record name
        name: String,
        /// What is missing
        reason: String,
    },

    /// A topic is already bound to a different schema
    #[error("Topic '{topic}' is bound to schema '{existing}', not '{requested}'")]
    SchemaConflict {
        /// Channel topic
        topic: String,
        /// Schema the topic is bound to
        existing: String,
        /// Schema that was requested
        requested: String,
    },

    /// Topic name is empty
    #[error("Topic name must not be empty")]
    EmptyTopic,

    /// No channel was added for the topic
    #[error("Unknown topic: '{topic}'")]
    UnknownTopic {
        /// Topic name
        topic: String,
    },

    /// The container layer rejected a write
    #[error("Container write failed: {message}")]
    ContainerWrite {
        /// Container error message
        message: String,
    },

    /// A bundled schema failed to build
    #[error("Invalid schema '{schema_name}': {reason}")]
    InvalidSchema {
        /// Schema name or file
        schema_name: String,
        /// Validation error message
        reason: String,
    },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Parser message
        message: String,
    },

    /// Underlying I/O failure
    #[error("I/O error: {message}")]
    Io {
        /// I/O error message
        message: String,
    },
}

impl TraceError {
    /// Create a "file not found" error.
    pub fn not_found(path: impl Into<String>) -> Self {
        TraceError::NotFound { path: path.into() }
    }

    /// Create an invalid extension error.
    pub fn invalid_extension(path: impl Into<String>, expected: &'static str) -> Self {
        TraceError::InvalidExtension {
            path: path.into(),
            expected,
        }
    }

    /// Create a corrupt container error.
    pub fn corrupt(path: impl Into<String>, reason: impl Into<String>) -> Self {
        TraceError::CorruptContainer {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown kind error.
    pub fn unknown_kind(name: impl Into<String>) -> Self {
        TraceError::UnknownKind { name: name.into() }
    }

    /// Create a deserialization error.
    pub fn deserialization(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        TraceError::DeserializationFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        TraceError::SerializationFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a missing required metadata error.
    pub fn missing_metadata(name: impl Into<String>, reason: impl Into<String>) -> Self {
        TraceError::MissingRequiredMetadata {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a container write error.
    pub fn container(message: impl std::fmt::Display) -> Self {
        TraceError::ContainerWrite {
            message: message.to_string(),
        }
    }

    /// Create an invalid schema error.
    pub fn invalid_schema(schema_name: impl Into<String>, reason: impl Into<String>) -> Self {
        TraceError::InvalidSchema {
            schema_name: schema_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        TraceError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether the stream is unreadable past this error.
    ///
    /// Precondition failures return `false`; the reader or writer remains
    /// usable after them.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            TraceError::TruncatedRecord { .. }
                | TraceError::CorruptContainer { .. }
                | TraceError::DeserializationFailed { .. }
                | TraceError::UnsupportedEncoding { .. }
        )
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            TraceError::NotFound { path } | TraceError::AmbiguousKind { path } => {
                vec![("path", path.clone())]
            }
            TraceError::InvalidExtension { path, expected } => {
                vec![("path", path.clone()), ("expected", expected.to_string())]
            }
            TraceError::AlreadyOpen { context } | TraceError::NotOpen { context } => {
                vec![("context", context.to_string())]
            }
            TraceError::NoMoreMessages | TraceError::EmptyTopic => Vec::new(),
            TraceError::CorruptContainer { path, reason } => {
                vec![("path", path.clone()), ("reason", reason.clone())]
            }
            TraceError::UnsupportedEncoding {
                topic,
                schema,
                encoding,
            } => vec![
                ("topic", topic.clone()),
                ("schema", schema.clone()),
                ("encoding", encoding.clone()),
            ],
            TraceError::UnknownKind { name } => vec![("kind", name.clone())],
            TraceError::TruncatedRecord {
                offset,
                expected,
                available,
            } => vec![
                ("offset", offset.to_string()),
                ("expected", expected.to_string()),
                ("available", available.to_string()),
            ],
            TraceError::DeserializationFailed { type_name, message }
            | TraceError::SerializationFailed { type_name, message } => {
                vec![("type", type_name.clone()), ("message", message.clone())]
            }
            TraceError::DuplicateMetadata { name } => vec![("metadata", name.clone())],
            TraceError::MissingRequiredMetadata { name, reason } => {
                vec![("metadata", name.clone()), ("reason", reason.clone())]
            }
            TraceError::SchemaConflict {
                topic,
                existing,
                requested,
            } => vec![
                ("topic", topic.clone()),
                ("existing", existing.clone()),
                ("requested", requested.clone()),
            ],
            TraceError::UnknownTopic { topic } => vec![("topic", topic.clone())],
            TraceError::ContainerWrite { message }
            | TraceError::InvalidConfig { message }
            | TraceError::Io { message } => vec![("message", message.clone())],
            TraceError::InvalidSchema {
                schema_name,
                reason,
            } => vec![("schema", schema_name.clone()), ("reason", reason.clone())],
        }
    }
}

impl From<std::io::Error> for TraceError {
    fn from(err: std::io::Error) -> Self {
        TraceError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for trace-file operations.
pub type Result<T> = std::result::Result<T, TraceError>;

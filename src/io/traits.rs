// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reader and writer contracts shared by every trace format.
//!
//! A session moves through `Unopened -> Open -> Closed`. `open` succeeds
//! from `Unopened` or `Closed` and fails with
//! [`TraceError::AlreadyOpen`](crate::TraceError::AlreadyOpen) while a
//! file is open. Operations on a closed session fail with
//! [`TraceError::NotOpen`](crate::TraceError::NotOpen).

use std::path::Path;

use prost_reflect::DynamicMessage;

use crate::core::{Result, TraceError};

use super::metadata::ReadResult;

/// Sequential reader of OSI messages.
///
/// # Example
///
/// ```no_run
/// use osi_trace::io::formats::binary::BinaryTraceFileReader;
/// use osi_trace::io::traits::TraceFileReader;
///
/// let mut reader = BinaryTraceFileReader::new();
/// reader.open("run_gt_.osi".as_ref())?;
/// for result in reader.messages() {
///     let result = result?;
///     println!("{}", result.kind);
/// }
/// # Ok::<(), osi_trace::TraceError>(())
/// ```
pub trait TraceFileReader {
    /// Open a trace, inferring anything the format needs from the path.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Whether another record is available.
    fn has_next(&self) -> bool;

    /// Read the next message.
    fn read_message(&mut self) -> Result<ReadResult>;

    /// Release the file. Closing an unopened reader is a no-op.
    fn close(&mut self);

    /// Whether a file is currently open.
    fn is_open(&self) -> bool;

    /// Iterate over the remaining messages.
    ///
    /// The iterator ends after the first corruption error.
    fn messages(&mut self) -> Messages<'_, Self>
    where
        Self: Sized,
    {
        Messages {
            reader: self,
            done: false,
        }
    }
}

impl<R: TraceFileReader + ?Sized> TraceFileReader for Box<R> {
    fn open(&mut self, path: &Path) -> Result<()> {
        (**self).open(path)
    }

    fn has_next(&self) -> bool {
        (**self).has_next()
    }

    fn read_message(&mut self) -> Result<ReadResult> {
        (**self).read_message()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// Iterator returned by [`TraceFileReader::messages`].
pub struct Messages<'a, R> {
    reader: &'a mut R,
    done: bool,
}

impl<R: TraceFileReader> Iterator for Messages<'_, R> {
    type Item = Result<ReadResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || !self.reader.has_next() {
            return None;
        }
        match self.reader.read_message() {
            Ok(result) => Some(Ok(result)),
            Err(TraceError::NoMoreMessages) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = e.is_corruption();
                Some(Err(e))
            }
        }
    }
}

/// Lifecycle shared by every trace writer.
pub trait TraceFileWriter {
    /// Create or truncate the output file.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Flush and release the file. Closing an unopened writer is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Whether a file is currently open.
    fn is_open(&self) -> bool;
}

/// Writer for single-stream formats, where the message alone decides the record.
pub trait MessageWriter: TraceFileWriter {
    /// Append one message.
    fn write_message(&mut self, message: &DynamicMessage) -> Result<()>;
}

//! Null streams: an input that is perpetually at end-of-stream, and an
//! output that discards everything written to it. Useful for dry-run
//! encoding (size counting) and for tests that need a well-formed stream
//! without backing storage.

use super::{Input, Output, RawInput, RawOutput, StreamMetadata};
use crate::header::ChecksumKind;
use std::io;

pub struct NullInputStream {
    metadata: StreamMetadata,
}

impl NullInputStream {
    pub fn new(version: u32, checksum_kind: ChecksumKind) -> Self {
        Self { metadata: StreamMetadata { version, checksum_kind } }
    }
}

impl RawInput for NullInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        Ok(buf.is_empty())
    }
}

impl Input for NullInputStream {
    fn skip(&mut self, _n: u64) -> io::Result<bool> {
        Ok(true)
    }

    fn is_finished(&mut self) -> io::Result<bool> {
        Ok(true)
    }

    fn metadata(&self) -> StreamMetadata {
        self.metadata
    }
}

pub struct NullOutputStream {
    metadata: StreamMetadata,
    pub bytes_written: u64,
}

impl NullOutputStream {
    pub fn new(version: u32, checksum_kind: ChecksumKind) -> Self {
        Self { metadata: StreamMetadata { version, checksum_kind }, bytes_written: 0 }
    }
}

impl RawOutput for NullOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<bool> {
        self.bytes_written += buf.len() as u64;
        Ok(true)
    }
}

impl Output for NullOutputStream {
    fn metadata(&self) -> StreamMetadata {
        self.metadata
    }
}

/// `null_input()`: a stream that is immediately at
/// end-of-stream, declaring the library's current format version and no
/// checksum.
pub fn null_input() -> NullInputStream {
    NullInputStream::new(crate::primitives::MAX_FORMAT_VERSION, ChecksumKind::None)
}

/// `null_output()`: a stream that discards everything written
/// to it, useful for dry-run size counting.
pub fn null_output() -> NullOutputStream {
    NullOutputStream::new(crate::primitives::MAX_FORMAT_VERSION, ChecksumKind::None)
}

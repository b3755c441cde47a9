//! In-memory `Input`/`Output` implementations over an owned byte buffer.
//! Useful for tests and for embedding without touching the filesystem.

use super::{Input, Output, RawInput, RawOutput, StreamMetadata};
use crate::header::ChecksumKind;
use std::io;

pub struct MemoryInputStream {
    data: Vec<u8>,
    pos: usize,
    metadata: StreamMetadata,
}

impl MemoryInputStream {
    pub fn new(data: Vec<u8>, version: u32, checksum_kind: ChecksumKind) -> Self {
        Self { data, pos: 0, metadata: StreamMetadata { version, checksum_kind } }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl RawInput for MemoryInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        if self.pos >= self.data.len() && !buf.is_empty() {
            return Ok(false);
        }
        if self.pos + buf.len() > self.data.len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"));
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(true)
    }
}

impl Input for MemoryInputStream {
    fn skip(&mut self, n: u64) -> io::Result<bool> {
        let n = n as usize;
        if self.pos + n > self.data.len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short skip"));
        }
        self.pos += n;
        Ok(true)
    }

    fn is_finished(&mut self) -> io::Result<bool> {
        Ok(self.pos >= self.data.len())
    }

    fn metadata(&self) -> StreamMetadata {
        self.metadata
    }
}

pub struct MemoryOutputStream {
    pub data: Vec<u8>,
    metadata: StreamMetadata,
}

impl MemoryOutputStream {
    pub fn new(version: u32, checksum_kind: ChecksumKind) -> Self {
        Self { data: Vec::new(), metadata: StreamMetadata { version, checksum_kind } }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl RawOutput for MemoryOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<bool> {
        self.data.extend_from_slice(buf);
        Ok(true)
    }
}

impl Output for MemoryOutputStream {
    fn metadata(&self) -> StreamMetadata {
        self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_exact_then_eof() {
        let mut s = MemoryInputStream::new(vec![1, 2, 3, 4], 1, ChecksumKind::None);
        let mut buf = [0u8; 4];
        assert!(s.read(&mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4]);
        assert!(s.is_finished().unwrap());
        let mut probe = [0u8; 0];
        assert!(s.read(&mut probe).unwrap());
    }

    #[test]
    fn write_accumulates() {
        let mut s = MemoryOutputStream::new(1, ChecksumKind::Crc32);
        s.write(&[1, 2]).unwrap();
        s.write(&[3]).unwrap();
        assert_eq!(s.into_inner(), vec![1, 2, 3]);
    }
}

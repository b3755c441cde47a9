//! Checksum engine: a fixed-capacity running checksum plus the
//! checksum-verifying input adapter that scopes it to one block.

use crate::header::{BlockHeader, ChecksumKind};
use crate::primitives;
use crate::stream::{Input, RawInput};
use std::io;

/// Running checksum, `(kind, ≤4-byte buffer, active length)`.
#[derive(Debug, Clone)]
pub struct Checksum {
    kind: ChecksumKind,
    buf: [u8; 4],
}

impl Checksum {
    pub fn new(kind: ChecksumKind) -> Self {
        Self { kind, buf: [0u8; 4] }
    }

    pub fn kind(&self) -> ChecksumKind {
        self.kind
    }

    /// Folds `bytes` into the running checksum. No-op for `ChecksumKind::None`.
    pub fn append(&mut self, bytes: &[u8]) {
        match self.kind {
            ChecksumKind::None => {}
            ChecksumKind::Crc32 => {
                let state = u32::from_le_bytes(self.buf);
                let mut c = primitives::Crc32::resume(state);
                c.update(bytes);
                self.buf = c.finalize().to_le_bytes();
            }
        }
    }

    /// Folds in a block header's fields, byte-for-byte as they appear on the
    /// wire: `kind, compression, uncompressed_size, [compressed_size]`.
    pub fn update_from_block_header(&mut self, header: &BlockHeader) {
        self.append(&header.to_bytes());
    }

    pub fn matches(&self, other: &[u8]) -> bool {
        &self.buf[..self.kind.size()] == &other[..self.kind.size()]
    }

    /// The active bytes of the running checksum buffer (0 or 4 long).
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.kind.size()]
    }
}

/// Decorator around an [`Input`] that, scoped to one block, splits reads
/// between payload (folded into a running checksum) and trailing checksum
/// bytes (collected for comparison).
pub struct ChecksumVerifyingInput<'a, I: Input + ?Sized> {
    inner: &'a mut I,
    checksum: Checksum,
    payload_size: usize,
    checksum_size: usize,
    bytes_read: usize,
    expected: [u8; 4],
}

impl<'a, I: Input + ?Sized> ChecksumVerifyingInput<'a, I> {
    pub fn new(inner: &'a mut I, header: &BlockHeader, checksum_kind: ChecksumKind) -> Self {
        let mut checksum = Checksum::new(checksum_kind);
        checksum.update_from_block_header(header);
        Self {
            inner,
            checksum,
            payload_size: crate::header::block_payload_size(header),
            checksum_size: checksum_kind.size(),
            bytes_read: 0,
            expected: [0u8; 4],
        }
    }

    pub fn is_checksum_correct(&self) -> bool {
        self.checksum.matches(&self.expected)
    }

    /// Bytes already read through the adapter for this block, payload and
    /// trailer combined.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Reads `n` bytes through the adapter, routing to checksum or expected
    /// buffer accounting, discarding the content. Used to drain a block that
    /// no handler consumed, while still covering it with the checksum.
    pub fn skip_draining(&mut self, n: usize, scratch: &mut [u8]) -> io::Result<bool> {
        let mut remaining = n;
        while remaining > 0 {
            let chunk = remaining.min(scratch.len().max(1));
            let buf = &mut scratch[..chunk.min(scratch.len())];
            if buf.is_empty() {
                // scratch buffer of length zero: fabricate a 1-byte window.
                let mut one = [0u8; 1];
                if !self.read(&mut one[..1])? {
                    return Ok(false);
                }
                remaining -= 1;
                continue;
            }
            if !self.read(buf)? {
                return Ok(false);
            }
            remaining -= buf.len();
        }
        Ok(true)
    }
}

impl<'a, I: Input + ?Sized> RawInput for ChecksumVerifyingInput<'a, I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        if self.bytes_read + buf.len() > self.payload_size + self.checksum_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "read past end of block through checksum-verifying adapter",
            ));
        }
        if !self.inner.read(buf)? {
            return Ok(false);
        }

        let start = self.bytes_read;
        let end = start + buf.len();
        if start < self.payload_size {
            let payload_end = end.min(self.payload_size);
            self.checksum.append(&buf[..payload_end - start]);
        }
        if end > self.payload_size {
            let cs_start = self.payload_size.max(start);
            let local_start = cs_start - start;
            for (i, b) in buf[local_start..].iter().enumerate() {
                let idx = (cs_start - self.payload_size) + i;
                if idx < 4 {
                    self.expected[idx] = *b;
                }
            }
        }
        self.bytes_read = end;
        Ok(true)
    }
}

impl<'a, I: Input + ?Sized> Input for ChecksumVerifyingInput<'a, I> {
    fn skip(&mut self, n: u64) -> io::Result<bool> {
        let mut scratch = [0u8; 64];
        self.skip_draining(n as usize, &mut scratch)
    }

    fn is_finished(&mut self) -> io::Result<bool> {
        Ok(self.bytes_read >= self.payload_size + self.checksum_size)
    }

    fn metadata(&self) -> crate::stream::StreamMetadata {
        self.inner.metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::BlockKind;
    use crate::stream::memory::MemoryInputStream;

    #[test]
    fn correct_checksum_is_detected() {
        let header = BlockHeader::new_uncompressed(BlockKind::GCode, 4);
        let mut checksum = Checksum::new(ChecksumKind::Crc32);
        checksum.update_from_block_header(&header);
        checksum.append(b"abcd");
        let expected = checksum.bytes().to_vec();

        let mut payload = header.to_bytes();
        payload.extend_from_slice(b"abcd");
        payload.extend_from_slice(&expected);

        let mut stream = MemoryInputStream::new(payload[header.to_bytes().len()..].to_vec(), 1, ChecksumKind::Crc32);
        let mut adapter = ChecksumVerifyingInput::new(&mut stream, &header, ChecksumKind::Crc32);
        let mut buf = [0u8; 4];
        assert!(adapter.read(&mut buf).unwrap());
        let mut cs = [0u8; 4];
        assert!(adapter.read(&mut cs).unwrap());
        assert!(adapter.is_checksum_correct());
    }

    #[test]
    fn tampered_payload_is_detected() {
        let header = BlockHeader::new_uncompressed(BlockKind::GCode, 4);
        let mut checksum = Checksum::new(ChecksumKind::Crc32);
        checksum.update_from_block_header(&header);
        checksum.append(b"abcd");
        let expected = checksum.bytes().to_vec();

        let mut payload = b"abXd".to_vec(); // tampered
        payload.extend_from_slice(&expected);

        let mut stream = MemoryInputStream::new(payload, 1, ChecksumKind::Crc32);
        let mut adapter = ChecksumVerifyingInput::new(&mut stream, &header, ChecksumKind::Crc32);
        let mut buf = [0u8; 4];
        assert!(adapter.read(&mut buf).unwrap());
        let mut cs = [0u8; 4];
        assert!(adapter.read(&mut cs).unwrap());
        assert!(!adapter.is_checksum_correct());
    }
}

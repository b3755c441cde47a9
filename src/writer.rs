//! Block writer: the symmetric counterpart to the parse driver.
//! Streams a block header, parameters, and payload bytes through a running
//! checksum, emitting the trailing checksum on finish.

use crate::checksum::Checksum;
use crate::error::{BgcodeError, Result};
use crate::header::{block_content_size, BlockHeader, BlockParameters, ChecksumKind};
use crate::stream::Output;

/// Wraps an [`Output`] stream and owns a running checksum scoped to the
/// block currently being written. Single-use per block: `start_block` →
/// `write_data`* → `finish_block`.
pub struct BlockWriter<'a, O: Output> {
    output: &'a mut O,
    checksum_kind: ChecksumKind,
    checksum: Option<Checksum>,
    content_size: usize,
    written: usize,
}

impl<'a, O: Output> BlockWriter<'a, O> {
    pub fn new(output: &'a mut O) -> Self {
        let checksum_kind = output.metadata().checksum_kind;
        Self { output, checksum_kind, checksum: None, content_size: 0, written: 0 }
    }

    /// Writes the block header and parameters, folding every byte into a
    /// fresh running checksum for this block.
    pub fn start_block(&mut self, header: &BlockHeader, params: &BlockParameters) -> Result<()> {
        let mut checksum = Checksum::new(self.checksum_kind);
        let header_bytes = header.to_bytes();
        checksum.update_from_block_header(header);
        if !self.output.write(&header_bytes).map_err(|_| BgcodeError::WriteError)? {
            return Err(BgcodeError::WriteError);
        }

        let params_bytes = params.to_bytes();
        checksum.append(&params_bytes);
        if !self.output.write(&params_bytes).map_err(|_| BgcodeError::WriteError)? {
            return Err(BgcodeError::WriteError);
        }

        self.content_size = block_content_size(self.checksum_kind, header) - self.checksum_kind.size();
        self.written = params_bytes.len();
        self.checksum = Some(checksum);
        Ok(())
    }

    /// Writes `bytes` of payload data, bounded by the declared content size
    /// (excluding the trailer).
    pub fn write_data(&mut self, bytes: &[u8]) -> Result<()> {
        if self.written + bytes.len() > self.content_size {
            return Err(BgcodeError::WriteError);
        }
        let checksum = self.checksum.as_mut().expect("start_block must precede write_data");
        checksum.append(bytes);
        if !self.output.write(bytes).map_err(|_| BgcodeError::WriteError)? {
            return Err(BgcodeError::WriteError);
        }
        self.written += bytes.len();
        Ok(())
    }

    /// Writes the fixed-width trailing checksum (if enabled) and resets for
    /// the next block.
    pub fn finish_block(&mut self) -> Result<()> {
        let checksum = self.checksum.take().expect("start_block must precede finish_block");
        if self.checksum_kind != ChecksumKind::None {
            if !self.output.write(checksum.bytes()).map_err(|_| BgcodeError::WriteError)? {
                return Err(BgcodeError::WriteError);
            }
        }
        self.written = 0;
        self.content_size = 0;
        Ok(())
    }
}

/// Standalone decorator used by clients that want to compute a checksum
/// while writing to any output stream, e.g. to verify against a stored
/// checksum separately from the block-writing protocol.
pub struct ChecksumWriter<'a, O: Output> {
    output: &'a mut O,
    checksum: Checksum,
}

impl<'a, O: Output> ChecksumWriter<'a, O> {
    pub fn new(output: &'a mut O, kind: ChecksumKind) -> Self {
        Self { output, checksum: Checksum::new(kind) }
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.checksum.append(bytes);
        if !self.output.write(bytes).map_err(|_| BgcodeError::WriteError)? {
            return Err(BgcodeError::WriteError);
        }
        Ok(())
    }

    pub fn checksum(&self) -> &[u8] {
        self.checksum.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{BlockHeader, BlockKind};
    use crate::stream::memory::MemoryOutputStream;

    #[test]
    fn writes_header_params_payload_and_checksum() {
        let mut out = MemoryOutputStream::new(1, ChecksumKind::Crc32);
        let header = BlockHeader::new_uncompressed(BlockKind::GCode, 4);
        let params = BlockParameters::Encoding(0);
        {
            let mut w = BlockWriter::new(&mut out);
            w.start_block(&header, &params).unwrap();
            w.write_data(b"abcd").unwrap();
            w.finish_block().unwrap();
        }
        let bytes = out.into_inner();
        // header(8) + params(2) + payload(4) + crc(4)
        assert_eq!(bytes.len(), 8 + 2 + 4 + 4);
    }

    #[test]
    fn overrunning_content_size_is_rejected() {
        let mut out = MemoryOutputStream::new(1, ChecksumKind::None);
        let header = BlockHeader::new_uncompressed(BlockKind::GCode, 2);
        let params = BlockParameters::Encoding(0);
        let mut w = BlockWriter::new(&mut out);
        w.start_block(&header, &params).unwrap();
        assert!(w.write_data(b"abc").is_err());
    }
}

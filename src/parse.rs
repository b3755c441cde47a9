//! Parse driver: reads successive block headers and delegates
//! each block to a parse-handler, skipping blocks nobody handled.

use crate::error::{BgcodeError, Result};
use crate::handlers::{BlockParseHandler, ParseHandler};
use crate::header::{
    block_content_size, block_parameters_size, BlockHeader, BlockKind, BlockParameters,
    CompressionKind,
};
use crate::primitives;
use crate::stream::Input;

/// Reads a block header from the current stream position. Returns `None` on
/// a clean end-of-stream (no bytes of a new header available). Once the
/// first byte of a header has been read, every remaining field is required;
/// a short read past that point is a truncated header, not end-of-stream.
pub fn read_block_header(input: &mut dyn Input) -> Result<Option<BlockHeader>> {
    let mut fixed = [0u8; 8];
    if !input.read(&mut fixed[..2])? {
        return Ok(None);
    }
    if !input.read(&mut fixed[2..])? {
        return Err(BgcodeError::ReadError);
    }

    let kind = BlockKind::from_u16(primitives::read_u16_le(&fixed[0..2]))?;
    let compression = CompressionKind::from_u16(primitives::read_u16_le(&fixed[2..4]))?;
    let uncompressed_size = primitives::read_u32_le(&fixed[4..8]);

    let compressed_size = if compression != CompressionKind::None {
        let mut buf = [0u8; 4];
        if !input.read(&mut buf)? {
            return Err(BgcodeError::ReadError);
        }
        primitives::read_u32_le(&buf)
    } else {
        uncompressed_size
    };

    Ok(Some(BlockHeader { kind, compression, uncompressed_size, compressed_size }))
}

/// Advances the stream by `block_content_size(checksum_kind, header)`,
/// covering parameters, payload and trailer.
pub fn skip_block(input: &mut dyn Input, header: &BlockHeader) -> Result<()> {
    let checksum_kind = input.metadata().checksum_kind;
    let size = block_content_size(checksum_kind, header);
    input.skip(size as u64)?;
    Ok(())
}

/// Loops reading block headers until end-of-stream or the handler refuses
/// to continue.
pub fn parse(input: &mut dyn Input, handler: &mut dyn ParseHandler) -> Result<()> {
    loop {
        let header = match read_block_header(input)? {
            Some(h) => h,
            None => return Ok(()),
        };

        let handled = handler.handle_block(input, &header)?;
        if !handled {
            skip_block(input, &header)?;
        }
        if !handler.can_continue() {
            return Ok(());
        }
    }
}

/// Default chunk size used when a block handler exposes no scratch buffer.
const FALLBACK_CHUNK_SIZE: usize = 64;

/// Drives a single block end to end: start, parameters, payload in chunks,
/// optional trailing checksum.
pub fn parse_block(
    input: &mut dyn Input,
    header: &BlockHeader,
    block_handler: &mut dyn BlockParseHandler,
) -> Result<()> {
    block_handler.block_start(header);

    let params_size = block_parameters_size(header.kind);
    let mut params_buf = [0u8; 6];
    input.read(&mut params_buf[..params_size])?;
    let params = BlockParameters::read(header.kind, &params_buf[..params_size]);
    match params {
        BlockParameters::Encoding(v) => block_handler.int_param("encoding_type", v as i64, 2),
        BlockParameters::Thumbnail { format, width, height } => {
            block_handler.int_param("format", format as i64, 2);
            block_handler.int_param("width", width as i64, 2);
            block_handler.int_param("height", height as i64, 2);
        }
    }

    let data_size = if header.compression == CompressionKind::None {
        header.uncompressed_size
    } else {
        header.compressed_size
    } as usize;

    let chunk_size = match block_handler.payload_chunk_size() {
        0 => FALLBACK_CHUNK_SIZE,
        n => n,
    };
    let mut buf = vec![0u8; chunk_size];
    let mut remaining = data_size;
    while remaining > 0 {
        let n = remaining.min(buf.len());
        input.read(&mut buf[..n])?;
        block_handler.payload(&buf[..n]);
        remaining -= n;
    }

    let checksum_kind = input.metadata().checksum_kind;
    let checksum_size = checksum_kind.size();
    if checksum_size > 0 {
        let mut cs_buf = [0u8; 4];
        input.read(&mut cs_buf[..checksum_size])?;
        block_handler.checksum(&cs_buf[..checksum_size]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ChecksumKind;
    use crate::stream::memory::MemoryInputStream;

    #[test]
    fn reads_block_header_without_compressed_size() {
        let bytes: Vec<u8> = vec![0x01, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00]; // GCode, None, 4
        let mut stream = MemoryInputStream::new(bytes, 1, ChecksumKind::None);
        let h = read_block_header(&mut stream).unwrap().unwrap();
        assert_eq!(h.kind, BlockKind::GCode);
        assert_eq!(h.compressed_size, 4);
    }

    #[test]
    fn empty_stream_yields_none() {
        let mut stream = MemoryInputStream::new(vec![], 1, ChecksumKind::None);
        assert!(read_block_header(&mut stream).unwrap().is_none());
    }
}

//! Stream-header and block-header (de)serialization.
//!
//! # On-disk layout
//!
//! ```text
//! StreamHeader   magic(4) version(u32) checksum_kind(u16)           = 10 bytes
//! BlockHeader    kind(u16) compression(u16) uncompressed_size(u32)
//!                [compressed_size(u32)]       ; present iff compression != None
//! BlockParameters
//!     metadata/gcode kinds: encoding(u16)                            =  2 bytes
//!     thumbnail:            format(u16) width(u16) height(u16)       =  6 bytes
//! ```
//!
//! # Endianness
//! All multi-byte fields are little-endian; see [`crate::primitives`].

use crate::error::{BgcodeError, Result};
use crate::primitives::{self, check_magic, MAGIC};

// ── Enumerations ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ChecksumKind {
    None = 0,
    Crc32 = 1,
}

impl ChecksumKind {
    pub fn from_u16(v: u16) -> Result<Self> {
        match v {
            0 => Ok(ChecksumKind::None),
            1 => Ok(ChecksumKind::Crc32),
            _ => Err(BgcodeError::InvalidChecksumType),
        }
    }

    /// Width of the trailing checksum bytes for this kind: 0 or 4.
    pub fn size(self) -> usize {
        match self {
            ChecksumKind::None => 0,
            ChecksumKind::Crc32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BlockKind {
    FileMetadata = 0,
    GCode = 1,
    SlicerMetadata = 2,
    PrinterMetadata = 3,
    PrintMetadata = 4,
    Thumbnail = 5,
}

impl BlockKind {
    pub fn from_u16(v: u16) -> Result<Self> {
        match v {
            0 => Ok(BlockKind::FileMetadata),
            1 => Ok(BlockKind::GCode),
            2 => Ok(BlockKind::SlicerMetadata),
            3 => Ok(BlockKind::PrinterMetadata),
            4 => Ok(BlockKind::PrintMetadata),
            5 => Ok(BlockKind::Thumbnail),
            _ => Err(BgcodeError::InvalidBlockType),
        }
    }

    /// True for every kind whose parameters are a single `encoding(u16)`.
    pub fn has_encoding_param(self) -> bool {
        !matches!(self, BlockKind::Thumbnail)
    }

    /// Allowed successor kinds per the ordering DFA. `None`
    /// predecessor (stream start) is handled separately by the caller.
    pub fn allowed_successors(self) -> &'static [BlockKind] {
        use BlockKind::*;
        match self {
            FileMetadata => &[PrinterMetadata],
            PrinterMetadata => &[Thumbnail, PrintMetadata],
            Thumbnail => &[Thumbnail, PrintMetadata],
            PrintMetadata => &[SlicerMetadata],
            SlicerMetadata => &[GCode],
            GCode => &[GCode],
        }
    }

    pub const START_SUCCESSORS: &'static [BlockKind] =
        &[BlockKind::FileMetadata, BlockKind::PrinterMetadata];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CompressionKind {
    None = 0,
    Deflate = 1,
    Heatshrink11_4 = 2,
    Heatshrink12_4 = 3,
}

impl CompressionKind {
    pub fn from_u16(v: u16) -> Result<Self> {
        match v {
            0 => Ok(CompressionKind::None),
            1 => Ok(CompressionKind::Deflate),
            2 => Ok(CompressionKind::Heatshrink11_4),
            3 => Ok(CompressionKind::Heatshrink12_4),
            _ => Err(BgcodeError::InvalidCompressionType),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MetadataEncoding {
    Ini = 0,
}

impl MetadataEncoding {
    pub fn from_u16(v: u16) -> Result<Self> {
        match v {
            0 => Ok(MetadataEncoding::Ini),
            _ => Err(BgcodeError::InvalidMetadataEncodingType),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum GCodeEncoding {
    None = 0,
    MeatPack = 1,
    MeatPackComments = 2,
}

impl GCodeEncoding {
    pub fn from_u16(v: u16) -> Result<Self> {
        match v {
            0 => Ok(GCodeEncoding::None),
            1 => Ok(GCodeEncoding::MeatPack),
            2 => Ok(GCodeEncoding::MeatPackComments),
            _ => Err(BgcodeError::InvalidGCodeEncodingType),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ThumbnailFormat {
    Png = 0,
    Jpg = 1,
    Qoi = 2,
}

impl ThumbnailFormat {
    pub fn from_u16(v: u16) -> Result<Self> {
        match v {
            0 => Ok(ThumbnailFormat::Png),
            1 => Ok(ThumbnailFormat::Jpg),
            2 => Ok(ThumbnailFormat::Qoi),
            _ => Err(BgcodeError::InvalidThumbnailFormat),
        }
    }
}

// ── StreamHeader ─────────────────────────────────────────────────────────────

pub const STREAM_HEADER_SIZE: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct StreamHeader {
    pub version: u32,
    pub checksum_kind: ChecksumKind,
}

impl StreamHeader {
    pub fn read(buf: &[u8; STREAM_HEADER_SIZE], max_version: Option<u32>) -> Result<Self> {
        let magic: [u8; 4] = buf[0..4].try_into().unwrap();
        check_magic(&magic)?;

        let version = primitives::read_u32_le(&buf[4..8]);
        if let Some(max) = max_version {
            if version > max {
                return Err(BgcodeError::InvalidVersionNumber);
            }
        }

        let checksum_kind = ChecksumKind::from_u16(primitives::read_u16_le(&buf[8..10]))?;

        Ok(Self { version, checksum_kind })
    }

    pub fn write(&self) -> [u8; STREAM_HEADER_SIZE] {
        let mut buf = [0u8; STREAM_HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        primitives::write_u32_le(&mut buf[4..8], self.version);
        primitives::write_u16_le(&mut buf[8..10], self.checksum_kind as u16);
        buf
    }
}

// ── BlockHeader ──────────────────────────────────────────────────────────────

/// On-wire size before any variable `compressed_size` field: kind(2) +
/// compression(2) + uncompressed_size(4).
pub const BLOCK_HEADER_FIXED_SIZE: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct BlockHeader {
    pub kind: BlockKind,
    pub compression: CompressionKind,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
}

impl BlockHeader {
    pub fn new_uncompressed(kind: BlockKind, uncompressed_size: u32) -> Self {
        Self {
            kind,
            compression: CompressionKind::None,
            uncompressed_size,
            compressed_size: uncompressed_size,
        }
    }

    /// Size of this header as it appears on the wire: 8 bytes, plus 4 more
    /// iff `compression != None`.
    pub fn wire_size(&self) -> usize {
        BLOCK_HEADER_FIXED_SIZE
            + if self.compression == CompressionKind::None { 0 } else { 4 }
    }

    /// Writes `kind compression uncompressed_size [compressed_size]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.wire_size()];
        primitives::write_u16_le(&mut buf[0..2], self.kind as u16);
        primitives::write_u16_le(&mut buf[2..4], self.compression as u16);
        primitives::write_u32_le(&mut buf[4..8], self.uncompressed_size);
        if self.compression != CompressionKind::None {
            primitives::write_u32_le(&mut buf[8..12], self.compressed_size);
        }
        buf
    }
}

pub fn block_parameters_size(kind: BlockKind) -> usize {
    if kind.has_encoding_param() {
        2
    } else {
        6
    }
}

pub fn block_payload_size(header: &BlockHeader) -> usize {
    let data_size = if header.compression == CompressionKind::None {
        header.uncompressed_size
    } else {
        header.compressed_size
    };
    block_parameters_size(header.kind) + data_size as usize
}

pub fn checksum_size(kind: ChecksumKind) -> usize {
    kind.size()
}

pub fn block_content_size(checksum_kind: ChecksumKind, header: &BlockHeader) -> usize {
    block_payload_size(header) + checksum_size(checksum_kind)
}

// ── BlockParameters ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum BlockParameters {
    Encoding(u16),
    Thumbnail { format: u16, width: u16, height: u16 },
}

impl BlockParameters {
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            BlockParameters::Encoding(v) => {
                let mut buf = [0u8; 2];
                primitives::write_u16_le(&mut buf, v);
                buf.to_vec()
            }
            BlockParameters::Thumbnail { format, width, height } => {
                let mut buf = [0u8; 6];
                primitives::write_u16_le(&mut buf[0..2], format);
                primitives::write_u16_le(&mut buf[2..4], width);
                primitives::write_u16_le(&mut buf[4..6], height);
                buf.to_vec()
            }
        }
    }

    pub fn read(kind: BlockKind, buf: &[u8]) -> Self {
        if kind.has_encoding_param() {
            BlockParameters::Encoding(primitives::read_u16_le(&buf[0..2]))
        } else {
            BlockParameters::Thumbnail {
                format: primitives::read_u16_le(&buf[0..2]),
                width: primitives::read_u16_le(&buf[2..4]),
                height: primitives::read_u16_le(&buf[4..6]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_header_round_trip() {
        let h = StreamHeader { version: 1, checksum_kind: ChecksumKind::Crc32 };
        let buf = h.write();
        let back = StreamHeader::read(&buf, None).unwrap();
        assert_eq!(back.version, 1);
        assert_eq!(back.checksum_kind, ChecksumKind::Crc32);
    }

    #[test]
    fn minimal_empty_container_no_checksum() {
        let buf: [u8; 10] = [0x47, 0x43, 0x44, 0x45, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        let h = StreamHeader::read(&buf, None).unwrap();
        assert_eq!(h.version, 1);
        assert_eq!(h.checksum_kind, ChecksumKind::None);
    }

    #[test]
    fn minimal_empty_container_crc32() {
        let buf: [u8; 10] = [0x47, 0x43, 0x44, 0x45, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00];
        let h = StreamHeader::read(&buf, None).unwrap();
        assert_eq!(h.checksum_kind, ChecksumKind::Crc32);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let buf: [u8; 10] = [0x47, 0x43, 0x44, 0x46, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(StreamHeader::read(&buf, None), Err(BgcodeError::InvalidMagicNumber)));
    }

    #[test]
    fn version_ceiling_is_enforced() {
        let buf: [u8; 10] = [0x47, 0x43, 0x44, 0x45, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            StreamHeader::read(&buf, Some(1)),
            Err(BgcodeError::InvalidVersionNumber)
        ));
    }

    #[test]
    fn block_header_no_compression_omits_compressed_size() {
        let h = BlockHeader::new_uncompressed(BlockKind::GCode, 42);
        assert_eq!(h.wire_size(), 8);
        assert_eq!(h.to_bytes().len(), 8);
    }

    #[test]
    fn block_header_compressed_includes_compressed_size() {
        let h = BlockHeader {
            kind: BlockKind::GCode,
            compression: CompressionKind::Deflate,
            uncompressed_size: 100,
            compressed_size: 40,
        };
        assert_eq!(h.wire_size(), 12);
        let bytes = h.to_bytes();
        assert_eq!(primitives::read_u32_le(&bytes[8..12]), 40);
    }

    #[test]
    fn thumbnail_block_matches_concrete_scenario() {
        // kind=Thumbnail(5) compression=None(0) uncompressed_size=4
        let header_bytes: [u8; 8] = [0x05, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00];
        let kind = BlockKind::from_u16(primitives::read_u16_le(&header_bytes[0..2])).unwrap();
        assert_eq!(kind, BlockKind::Thumbnail);
        let params_bytes: [u8; 6] = [0x00, 0x00, 0x01, 0x00, 0x01, 0x00];
        let params = BlockParameters::read(kind, &params_bytes);
        match params {
            BlockParameters::Thumbnail { format, width, height } => {
                assert_eq!((format, width, height), (0, 1, 1));
            }
            _ => panic!("expected thumbnail params"),
        }
    }
}

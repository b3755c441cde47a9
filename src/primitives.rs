//! Primitive codec: little-endian integers, the stream magic, CRC-32.
//!
//! # Endianness
//! Every multi-byte field in this format is little-endian. This is the one
//! invariant every other module leans on without re-checking.

use crate::error::{BgcodeError, Result};

/// Stream magic, ASCII `GCDE`.
pub const MAGIC: [u8; 4] = *b"GCDE";

/// Highest format version this build understands.
pub const MAX_FORMAT_VERSION: u32 = 1;

/// `max_format_version()`.
pub fn max_format_version() -> u32 {
    MAX_FORMAT_VERSION
}

/// `library_version()`: the crate's own semver, not the wire
/// format version.
pub fn library_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Reads `width` little-endian bytes from `buf` starting at `pos`, zero-extended
/// into a `u64`. `width` must be `<= 8`.
pub fn read_uint_le(buf: &[u8], width: usize) -> u64 {
    debug_assert!(width <= 8);
    let mut v: u64 = 0;
    for (i, b) in buf[..width].iter().enumerate() {
        v |= (*b as u64) << (8 * i);
    }
    v
}

/// Writes the low `width` bytes of `value`, little-endian, into `buf`.
pub fn write_uint_le(buf: &mut [u8], value: u64, width: usize) {
    debug_assert!(width <= 8);
    for i in 0..width {
        buf[i] = ((value >> (8 * i)) & 0xFF) as u8;
    }
}

pub fn read_u16_le(buf: &[u8]) -> u16 {
    read_uint_le(buf, 2) as u16
}

pub fn read_u32_le(buf: &[u8]) -> u32 {
    read_uint_le(buf, 4) as u32
}

pub fn write_u16_le(buf: &mut [u8], v: u16) {
    write_uint_le(buf, v as u64, 2);
}

pub fn write_u32_le(buf: &mut [u8], v: u32) {
    write_uint_le(buf, v as u64, 4);
}

/// CRC-32 (reflected, polynomial 0xEDB88320, init/final XOR 0xFFFFFFFF) —
/// the common "CRC-32/ISO-HDLC" variant. Backed by `crc32fast`'s table/SIMD
/// implementation rather than a hand-rolled bit loop.
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    pub fn new() -> Self {
        Self { hasher: crc32fast::Hasher::new() }
    }

    /// Resumes a running CRC from a previously-finalized value, matching the
    /// checksum engine's "reinterpret the buffer as u32, fold bytes in"
    /// semantics.
    pub fn resume(state: u32) -> Self {
        Self { hasher: crc32fast::Hasher::new_with_initial(state) }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot CRC-32 over a full slice.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut c = Crc32::new();
    c.update(bytes);
    c.finalize()
}

pub fn check_magic(buf: &[u8; 4]) -> Result<()> {
    if *buf != MAGIC {
        Err(BgcodeError::InvalidMagicNumber)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_round_trip() {
        let mut buf = [0u8; 4];
        write_u32_le(&mut buf, 0xDEAD_BEEF);
        assert_eq!(read_u32_le(&buf), 0xDEAD_BEEF);
    }

    #[test]
    fn crc32_matches_known_vector() {
        // "123456789" is the standard CRC-32/ISO-HDLC check vector.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn crc32_is_associative_over_partitions() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let whole = crc32(data);

        let mut c = Crc32::new();
        for chunk in data.chunks(3) {
            c.update(chunk);
        }
        assert_eq!(c.finalize(), whole);
    }

    #[test]
    fn magic_mismatch_is_rejected() {
        assert!(check_magic(&MAGIC).is_ok());
        assert!(check_magic(b"GCDF").is_err());
    }
}

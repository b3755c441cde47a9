//! Write-side counterpart to [`crate::decompress`]: compresses a whole
//! payload buffer before it is handed to [`crate::writer::BlockWriter`].
//! The core wire format and its invariants only constrain the
//! *decompression* side — compression is a convenience the `document`
//! façade and the CLI build on top, not a requirement of the streaming
//! core itself.

use crate::error::{BgcodeError, Result};
use crate::header::CompressionKind;
use embedded_heatshrink::{HSEPollRes, HeatshrinkEncoder};

pub fn compress(kind: CompressionKind, data: &[u8]) -> Result<Vec<u8>> {
    match kind {
        CompressionKind::None => Ok(data.to_vec()),
        CompressionKind::Deflate => Ok(miniz_oxide::deflate::compress_to_vec_zlib(data, 6)),
        CompressionKind::Heatshrink11_4 => heatshrink_compress(data, 11, 4),
        CompressionKind::Heatshrink12_4 => heatshrink_compress(data, 12, 4),
    }
}

fn heatshrink_compress(data: &[u8], window: u8, lookahead: u8) -> Result<Vec<u8>> {
    let mut encoder = HeatshrinkEncoder::new(1 << 16, window, lookahead);
    let mut out = Vec::with_capacity(data.len());
    let mut buf = [0u8; 256];

    encoder
        .sink(data)
        .map_err(|_| BgcodeError::DataCompressionError("heatshrink sink overflow".into()))?;
    loop {
        match encoder.poll(&mut buf) {
            HSEPollRes::More(n) => out.extend_from_slice(&buf[..n]),
            HSEPollRes::Empty(n) => {
                if n > 0 {
                    out.extend_from_slice(&buf[..n]);
                }
                break;
            }
            HSEPollRes::ErrorNull | HSEPollRes::ErrorUnknown => {
                return Err(BgcodeError::DataCompressionError("heatshrink encode error".into()));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompress::Decompressor;

    #[test]
    fn deflate_round_trips_through_the_decompressor() {
        let data = b"G1 X10 Y10\nG1 X20 Y20\nG1 X30 Y30\n".repeat(8);
        let packed = compress(CompressionKind::Deflate, &data).unwrap();

        let mut d = Decompressor::new();
        d.reset(CompressionKind::Deflate);
        let mut out = Vec::new();
        let mut workbuf = [0u8; 256];
        d.append(&mut |b: &[u8]| { out.extend_from_slice(b); Ok(()) }, &packed, &mut workbuf).unwrap();
        d.finish(&mut |b: &[u8]| { out.extend_from_slice(b); Ok(()) }, &[], &mut workbuf).unwrap();
        assert_eq!(out, data);
    }
}

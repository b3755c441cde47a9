//! Stable error codes, in the order fixed by the wire contract.
//!
//! Every variant here corresponds 1:1 to a numeric id in the public ABI.
//! The order of declaration is part of that contract: do not reorder,
//! only append before `UnknownError`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BgcodeError>;

#[derive(Error, Debug)]
pub enum BgcodeError {
    #[error("read error")]
    ReadError,
    #[error("write error")]
    WriteError,
    #[error("invalid magic number")]
    InvalidMagicNumber,
    #[error("invalid version number")]
    InvalidVersionNumber,
    #[error("invalid checksum type")]
    InvalidChecksumType,
    #[error("invalid block type")]
    InvalidBlockType,
    #[error("invalid compression type")]
    InvalidCompressionType,
    #[error("invalid metadata encoding type")]
    InvalidMetadataEncodingType,
    #[error("invalid gcode encoding type")]
    InvalidGCodeEncodingType,
    #[error("data compression error: {0}")]
    DataCompressionError(String),
    #[error("data uncompression error: {0}")]
    DataUncompressionError(String),
    #[error("metadata encoding error: {0}")]
    MetadataEncodingError(String),
    #[error("metadata decoding error: {0}")]
    MetadataDecodingError(String),
    #[error("gcode encoding error: {0}")]
    GCodeEncodingError(String),
    #[error("gcode decoding error: {0}")]
    GCodeDecodingError(String),
    #[error("block not found")]
    BlockNotFound,
    #[error("invalid checksum")]
    InvalidChecksum,
    #[error("invalid thumbnail format")]
    InvalidThumbnailFormat,
    #[error("invalid thumbnail width")]
    InvalidThumbnailWidth,
    #[error("invalid thumbnail height")]
    InvalidThumbnailHeight,
    #[error("invalid thumbnail data size")]
    InvalidThumbnailDataSize,
    #[error("invalid binary gcode file")]
    InvalidBinaryGCodeFile,
    #[error("invalid ascii gcode file")]
    InvalidAsciiGCodeFile,
    #[error("invalid sequence of blocks")]
    InvalidSequenceOfBlocks,
    #[error("invalid buffer")]
    InvalidBuffer,
    #[error("already binarized")]
    AlreadyBinarized,
    #[error("missing printer metadata")]
    MissingPrinterMetadata,
    #[error("missing print metadata")]
    MissingPrintMetadata,
    #[error("missing slicer metadata")]
    MissingSlicerMetadata,
    #[error("out of memory")]
    OutOfMemory,
    #[error("unknown error: {0}")]
    UnknownError(String),
}

impl From<std::io::Error> for BgcodeError {
    /// Any I/O failure at the stream boundary becomes a `ReadError`; callers
    /// that need write-side semantics should map explicitly (the stream
    /// traits never mix `Read`/`Write` errors through one call).
    fn from(_err: std::io::Error) -> Self {
        BgcodeError::ReadError
    }
}

/// Human-readable description of an error code ( `translate_result`).
///
/// Delegates to `Display` rather than maintaining a second table.
pub fn translate_result(err: &BgcodeError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_result_matches_display() {
        let e = BgcodeError::InvalidMagicNumber;
        assert_eq!(translate_result(&e), "invalid magic number");
    }
}

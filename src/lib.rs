//! # bgcode — binary G-code container codec
//!
//! A streaming codec for the block-structured binary container that
//! transports 3D-printer G-code together with its metadata and thumbnails.
//!
//! Format guarantees:
//! - Every multi-byte field is little-endian; never negotiated.
//! - A container is one stream header followed by a strictly ordered
//!   sequence of typed blocks (see [`header::BlockKind::allowed_successors`]
//!   for the ordering DFA).
//! - Each block carries a fixed-width parameter prelude, an optionally
//!   compressed payload, and an optional fixed-width (0 or 4 byte) checksum
//!   trailer.
//! - The canonical reader composition is
//!   `OrderChecking(ChecksumChecking(AllBlocks(Unpacking(application_handler))))`
//!   — see [`document::Document::read`] for the ready-made façade, or
//!   compose [`handlers`] yourself for streaming access.

pub mod alloc;
pub mod checksum;
pub mod compress;
pub mod decompress;
pub mod document;
pub mod error;
pub mod gcode;
pub mod handlers;
pub mod header;
pub mod parse;
pub mod primitives;
pub mod stream;
pub mod writer;

pub use document::{Document, Thumbnail, WriteOptions};
pub use error::{translate_result, BgcodeError, Result};
pub use header::{
    BlockHeader, BlockKind, BlockParameters, ChecksumKind, CompressionKind, GCodeEncoding,
    MetadataEncoding, StreamHeader, ThumbnailFormat,
};
pub use primitives::{library_version, max_format_version, MAGIC, MAX_FORMAT_VERSION};
pub use stream::file::{open_file_input, open_file_output};
pub use stream::null::{null_input, null_output};

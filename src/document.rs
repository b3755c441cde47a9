//! A concrete [`BlockParseHandler`] plus a `Document` facade over the
//! streaming core, for the common case of reading or writing a whole
//! container in memory.

use crate::error::{BgcodeError, Result};
use crate::gcode::{GCodeCodec, MeatPackCodec, NoneCodec};
use crate::handlers::{
    AllBlocksParseHandler, BlockParseHandler, ChecksumCheckingParseHandler, HandlerStatus,
    OrderCheckingParseHandler, UnpackingBlockParseHandler,
};
use crate::header::{
    BlockHeader, BlockKind, BlockParameters, ChecksumKind, CompressionKind, GCodeEncoding,
    MetadataEncoding, ThumbnailFormat,
};
use crate::parse;
use crate::primitives::MAX_FORMAT_VERSION;
use crate::stream::file::{open_file_input, open_file_output, FileOutputStream};
use crate::writer::BlockWriter;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub format: ThumbnailFormat,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

/// In-memory representation of a whole container: every metadata block's
/// INI key/value pairs (in file order), every thumbnail, and the decoded
/// ASCII G-code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub file_metadata: Vec<(String, String)>,
    pub printer_metadata: Vec<(String, String)>,
    pub print_metadata: Vec<(String, String)>,
    pub slicer_metadata: Vec<(String, String)>,
    pub thumbnails: Vec<Thumbnail>,
    pub gcode: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub checksum_kind: ChecksumKind,
    pub version: u32,
    pub compression: CompressionKind,
    pub gcode_encoding: GCodeEncoding,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            checksum_kind: ChecksumKind::Crc32,
            version: MAX_FORMAT_VERSION,
            compression: CompressionKind::None,
            gcode_encoding: GCodeEncoding::None,
        }
    }
}

fn parse_ini(bytes: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(bytes);
    let mut pairs = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            pairs.push((k.trim().to_string(), v.trim().to_string()));
        }
    }
    pairs
}

fn write_ini(pairs: &[(String, String)]) -> Vec<u8> {
    let mut out = String::new();
    for (k, v) in pairs {
        out.push_str(k);
        out.push_str(" = ");
        out.push_str(v);
        out.push('\n');
    }
    out.into_bytes()
}

/// The header fields of the block currently being accumulated, plus its
/// payload bytes collected so far. `parse_block` has no "block end" event,
/// so [`DocumentBuilder`] finalizes a pending block lazily when the next
/// one starts (or when the caller calls [`DocumentBuilder::finish`]).
struct Pending {
    kind: BlockKind,
    encoding: u16,
    thumb_format: u16,
    thumb_width: u16,
    thumb_height: u16,
    data: Vec<u8>,
}

struct DocumentBuilder {
    document: Document,
    current: Option<Pending>,
    /// The first error any flushed block produced. `block_start` can't
    /// return a `Result` (the `BlockParseHandler` contract is infallible),
    /// so a failure there is latched here and replayed by `finish`/`status`
    /// instead of being dropped on the floor.
    error: Option<BgcodeError>,
}

impl DocumentBuilder {
    fn new() -> Self {
        Self { document: Document::default(), current: None, error: None }
    }

    fn flush_current(&mut self) -> Result<()> {
        let Some(p) = self.current.take() else { return Ok(()) };
        match p.kind {
            BlockKind::FileMetadata => self.document.file_metadata.extend(parse_ini(&p.data)),
            BlockKind::PrinterMetadata => self.document.printer_metadata.extend(parse_ini(&p.data)),
            BlockKind::PrintMetadata => self.document.print_metadata.extend(parse_ini(&p.data)),
            BlockKind::SlicerMetadata => self.document.slicer_metadata.extend(parse_ini(&p.data)),
            BlockKind::Thumbnail => {
                let format = ThumbnailFormat::from_u16(p.thumb_format)?;
                self.document.thumbnails.push(Thumbnail {
                    format,
                    width: p.thumb_width,
                    height: p.thumb_height,
                    data: p.data,
                });
            }
            BlockKind::GCode => {
                let encoding = GCodeEncoding::from_u16(p.encoding)?;
                let decoded = decode_gcode(encoding, &p.data)?;
                self.document.gcode.extend_from_slice(&decoded);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Document> {
        let last = self.flush_current();
        if let Some(err) = self.error {
            return Err(err);
        }
        last?;
        Ok(self.document)
    }
}

fn decode_gcode(encoding: GCodeEncoding, data: &[u8]) -> Result<Vec<u8>> {
    match encoding {
        GCodeEncoding::None => NoneCodec.decode(data),
        GCodeEncoding::MeatPack => MeatPackCodec::new(false).decode(data),
        GCodeEncoding::MeatPackComments => MeatPackCodec::new(true).decode(data),
    }
}

fn encode_gcode(encoding: GCodeEncoding, data: &[u8]) -> Result<Vec<u8>> {
    match encoding {
        GCodeEncoding::None => NoneCodec.encode(data),
        GCodeEncoding::MeatPack => MeatPackCodec::new(false).encode(data),
        GCodeEncoding::MeatPackComments => MeatPackCodec::new(true).encode(data),
    }
}

impl BlockParseHandler for DocumentBuilder {
    fn block_start(&mut self, header: &BlockHeader) {
        if let Err(err) = self.flush_current() {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
        self.current = Some(Pending {
            kind: header.kind,
            encoding: 0,
            thumb_format: 0,
            thumb_width: 0,
            thumb_height: 0,
            data: Vec::new(),
        });
    }

    fn int_param(&mut self, name: &str, value: i64, _byte_width: usize) {
        let Some(p) = self.current.as_mut() else { return };
        match name {
            "encoding_type" => p.encoding = value as u16,
            "format" => p.thumb_format = value as u16,
            "width" => p.thumb_width = value as u16,
            "height" => p.thumb_height = value as u16,
            _ => {}
        }
    }

    fn payload(&mut self, bytes: &[u8]) {
        if let Some(p) = self.current.as_mut() {
            p.data.extend_from_slice(bytes);
        }
    }

    fn status(&self) -> HandlerStatus {
        if self.error.is_some() {
            HandlerStatus::Stop
        } else {
            HandlerStatus::Ok
        }
    }
}

impl Document {
    /// Reads a whole container from `path` via the canonical handler
    /// composition: `OrderChecking(ChecksumChecking(AllBlocks(Unpacking(...))))`.
    pub fn read(path: impl AsRef<Path>, max_version: Option<u32>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut input = open_file_input(file, max_version)?;

        let builder = DocumentBuilder::new();
        let unpacking = UnpackingBlockParseHandler::new(builder, 64 * 1024);
        let all_blocks = AllBlocksParseHandler::new(unpacking);
        let checksum_checking = ChecksumCheckingParseHandler::new(all_blocks);
        let mut order_checking = OrderCheckingParseHandler::new(checksum_checking);

        parse::parse(&mut input, &mut order_checking)?;

        order_checking.into_inner().into_inner().into_inner().into_inner().finish()
    }

    /// Validates the metadata dependencies the ordering DFA imposes on any
    /// document that carries G-code or thumbnails, then writes the
    /// container to `path` in DFA order.
    pub fn write(&self, path: impl AsRef<Path>, options: WriteOptions) -> Result<()> {
        self.validate_for_write()?;

        let file = File::create(path.as_ref())?;
        let mut output = open_file_output(file, options.checksum_kind, options.version)?;

        if !self.file_metadata.is_empty() {
            write_metadata_block(&mut output, BlockKind::FileMetadata, &self.file_metadata)?;
        }
        if !self.printer_metadata.is_empty() {
            write_metadata_block(&mut output, BlockKind::PrinterMetadata, &self.printer_metadata)?;
        }
        for thumb in &self.thumbnails {
            write_thumbnail_block(&mut output, thumb)?;
        }
        if !self.print_metadata.is_empty() {
            write_metadata_block(&mut output, BlockKind::PrintMetadata, &self.print_metadata)?;
        }
        if !self.slicer_metadata.is_empty() {
            write_metadata_block(&mut output, BlockKind::SlicerMetadata, &self.slicer_metadata)?;
        }
        if !self.gcode.is_empty() {
            write_gcode_block(&mut output, &self.gcode, options.compression, options.gcode_encoding)?;
        }
        Ok(())
    }

    fn validate_for_write(&self) -> Result<()> {
        let needs_printer =
            !self.print_metadata.is_empty() || !self.thumbnails.is_empty() || !self.gcode.is_empty();
        if needs_printer && self.printer_metadata.is_empty() {
            return Err(BgcodeError::MissingPrinterMetadata);
        }
        if !self.gcode.is_empty() && self.print_metadata.is_empty() {
            return Err(BgcodeError::MissingPrintMetadata);
        }
        if !self.gcode.is_empty() && self.slicer_metadata.is_empty() {
            return Err(BgcodeError::MissingSlicerMetadata);
        }
        Ok(())
    }
}

fn write_metadata_block(
    output: &mut FileOutputStream,
    kind: BlockKind,
    pairs: &[(String, String)],
) -> Result<()> {
    let ini = write_ini(pairs);
    let header = BlockHeader::new_uncompressed(kind, ini.len() as u32);
    let params = BlockParameters::Encoding(MetadataEncoding::Ini as u16);
    let mut w = BlockWriter::new(output);
    w.start_block(&header, &params)?;
    w.write_data(&ini)?;
    w.finish_block()
}

fn write_thumbnail_block(output: &mut FileOutputStream, thumb: &Thumbnail) -> Result<()> {
    let header = BlockHeader::new_uncompressed(BlockKind::Thumbnail, thumb.data.len() as u32);
    let params = BlockParameters::Thumbnail {
        format: thumb.format as u16,
        width: thumb.width,
        height: thumb.height,
    };
    let mut w = BlockWriter::new(output);
    w.start_block(&header, &params)?;
    w.write_data(&thumb.data)?;
    w.finish_block()
}

fn write_gcode_block(
    output: &mut FileOutputStream,
    ascii: &[u8],
    compression: CompressionKind,
    encoding: GCodeEncoding,
) -> Result<()> {
    let encoded = encode_gcode(encoding, ascii)?;
    let (compressed, header) = match compression {
        CompressionKind::None => {
            let header = BlockHeader::new_uncompressed(BlockKind::GCode, encoded.len() as u32);
            (encoded, header)
        }
        other => {
            let packed = crate::compress::compress(other, &encoded)?;
            let header = BlockHeader {
                kind: BlockKind::GCode,
                compression: other,
                uncompressed_size: encoded.len() as u32,
                compressed_size: packed.len() as u32,
            };
            (packed, header)
        }
    };
    let params = BlockParameters::Encoding(encoding as u16);
    let mut w = BlockWriter::new(output);
    w.start_block(&header, &params)?;
    w.write_data(&compressed)?;
    w.finish_block()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ini_round_trips() {
        let pairs = vec![("model".to_string(), "X1C".to_string()), ("nozzle".to_string(), "0.4".to_string())];
        let bytes = write_ini(&pairs);
        assert_eq!(parse_ini(&bytes), pairs);
    }

    #[test]
    fn ini_skips_comments_and_blank_lines() {
        let bytes = b"; a comment\n\nmodel = X1C\n".to_vec();
        assert_eq!(parse_ini(&bytes), vec![("model".to_string(), "X1C".to_string())]);
    }

    #[test]
    fn malformed_block_before_the_last_one_is_not_dropped() {
        use crate::stream::memory::MemoryOutputStream;

        let mut out = MemoryOutputStream::new(1, ChecksumKind::None);
        {
            let header = BlockHeader::new_uncompressed(BlockKind::PrinterMetadata, 6);
            let params = BlockParameters::Encoding(MetadataEncoding::Ini as u16);
            let mut w = BlockWriter::new(&mut out);
            w.start_block(&header, &params).unwrap();
            w.write_data(b"a = b\n").unwrap();
            w.finish_block().unwrap();
        }
        {
            // format=99 is outside the defined ThumbnailFormat set.
            let header = BlockHeader::new_uncompressed(BlockKind::Thumbnail, 0);
            let params = BlockParameters::Thumbnail { format: 99, width: 1, height: 1 };
            let mut w = BlockWriter::new(&mut out);
            w.start_block(&header, &params).unwrap();
            w.finish_block().unwrap();
        }
        {
            let header = BlockHeader::new_uncompressed(BlockKind::PrintMetadata, 6);
            let params = BlockParameters::Encoding(MetadataEncoding::Ini as u16);
            let mut w = BlockWriter::new(&mut out);
            w.start_block(&header, &params).unwrap();
            w.write_data(b"c = d\n").unwrap();
            w.finish_block().unwrap();
        }

        let mut input =
            crate::stream::memory::MemoryInputStream::new(out.into_inner(), 1, ChecksumKind::None);
        let builder = DocumentBuilder::new();
        let mut all_blocks = AllBlocksParseHandler::new(builder);
        parse::parse(&mut input, &mut all_blocks).unwrap();

        let result = all_blocks.into_inner().finish();
        assert!(matches!(result, Err(BgcodeError::InvalidThumbnailFormat)));
    }

    #[test]
    fn validate_requires_printer_metadata_for_thumbnails() {
        let mut doc = Document::default();
        doc.thumbnails.push(Thumbnail { format: ThumbnailFormat::Png, width: 1, height: 1, data: vec![0] });
        assert!(matches!(doc.validate_for_write(), Err(BgcodeError::MissingPrinterMetadata)));
    }

    #[test]
    fn validate_requires_print_and_slicer_metadata_for_gcode() {
        let mut doc = Document::default();
        doc.printer_metadata.push(("k".into(), "v".into()));
        doc.gcode = b"G1 X1\n".to_vec();
        assert!(matches!(doc.validate_for_write(), Err(BgcodeError::MissingPrintMetadata)));
        doc.print_metadata.push(("k".into(), "v".into()));
        assert!(matches!(doc.validate_for_write(), Err(BgcodeError::MissingSlicerMetadata)));
        doc.slicer_metadata.push(("k".into(), "v".into()));
        assert!(doc.validate_for_write().is_ok());
    }

    #[test]
    fn empty_document_writes_nothing_and_needs_no_metadata() {
        let doc = Document::default();
        assert!(doc.validate_for_write().is_ok());
    }
}

//! File-backed `Input`/`Output`, built on `std::fs::File` the way the
//! teacher's `io_stream` module is generic over any `Read + Seek` /
//! `Write + Seek`.

use super::{Input, Output, RawInput, RawOutput, StreamMetadata};
use crate::error::{BgcodeError, Result};
use crate::header::{ChecksumKind, StreamHeader, STREAM_HEADER_SIZE};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

pub struct FileInputStream {
    file: File,
    metadata: StreamMetadata,
}

impl FileInputStream {
    pub fn open(file: File, version: u32, checksum_kind: ChecksumKind) -> Self {
        Self { file, metadata: StreamMetadata { version, checksum_kind } }
    }
}

impl RawInput for FileInputStream {
    /// Fills `buf` in full. Returns `Ok(false)` only when the stream was
    /// already at end-of-stream before any byte of this call was read;
    /// hitting EOF after filling part of `buf` is a genuine truncation and
    /// is reported as an error, never silently collapsed into `Ok(false)`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        if buf.is_empty() {
            return Ok(true);
        }
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => {
                    if filled == 0 {
                        return Ok(false);
                    }
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended partway through a read",
                    ));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}

impl Input for FileInputStream {
    fn skip(&mut self, n: u64) -> io::Result<bool> {
        self.file.seek(SeekFrom::Current(n as i64))?;
        Ok(true)
    }

    fn is_finished(&mut self) -> io::Result<bool> {
        let pos = self.file.stream_position()?;
        let len = self.file.metadata()?.len();
        Ok(pos >= len)
    }

    fn metadata(&self) -> StreamMetadata {
        self.metadata
    }
}

pub struct FileOutputStream {
    file: File,
    metadata: StreamMetadata,
}

impl FileOutputStream {
    pub fn create(file: File, version: u32, checksum_kind: ChecksumKind) -> Self {
        Self { file, metadata: StreamMetadata { version, checksum_kind } }
    }
}

impl RawOutput for FileOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<bool> {
        self.file.write_all(buf)?;
        Ok(true)
    }
}

impl Output for FileOutputStream {
    fn metadata(&self) -> StreamMetadata {
        self.metadata
    }
}

/// Reads the stream header off `file` and wraps the remainder in a
/// [`FileInputStream`] carrying the version/checksum-kind it declared.
pub fn open_file_input(mut file: File, max_version: Option<u32>) -> Result<FileInputStream> {
    let mut buf = [0u8; STREAM_HEADER_SIZE];
    file.read_exact(&mut buf).map_err(|_| BgcodeError::ReadError)?;
    let header = StreamHeader::read(&buf, max_version)?;
    Ok(FileInputStream::open(file, header.version, header.checksum_kind))
}

/// Writes a stream header for `checksum_kind`/`version` to `file`, then
/// wraps it in a [`FileOutputStream`] ready for the first block.
pub fn open_file_output(
    mut file: File,
    checksum_kind: ChecksumKind,
    version: u32,
) -> Result<FileOutputStream> {
    let header = StreamHeader { version, checksum_kind };
    file.write_all(&header.write()).map_err(|_| BgcodeError::WriteError)?;
    Ok(FileOutputStream::create(file, version, checksum_kind))
}

//! Streaming decompressor: a tagged variant over
//! `{Identity, Deflate, Heatshrink11_4, Heatshrink12_4}` with one incremental
//! contract, delivering uncompressed bytes to a caller-supplied sink.
//!
//! Deflate is backed by `miniz_oxide`'s streaming inflate; the two
//! Heatshrink variants by the `embedded_heatshrink` crate, matching the
//! wire format's fixed `(window, lookahead)` parameters.

use crate::error::{BgcodeError, Result};
use crate::header::CompressionKind;
use embedded_heatshrink::{HSDPollRes, HeatshrinkDecoder};
use miniz_oxide::inflate::stream::{inflate, InflateState};
use miniz_oxide::{DataFormat, MZFlush, MZStatus};

/// Sink that receives successive chunks of uncompressed output.
pub trait PayloadSink {
    fn consume(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<F: FnMut(&[u8]) -> Result<()>> PayloadSink for F {
    fn consume(&mut self, bytes: &[u8]) -> Result<()> {
        self(bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Finished,
    Failed,
}

enum Codec {
    Identity,
    Deflate(Box<InflateState>),
    Heatshrink(HeatshrinkDecoder),
}

pub struct Decompressor {
    codec: Codec,
    state: State,
    processed_input: u64,
    processed_output: u64,
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            codec: Codec::Identity,
            state: State::Idle,
            processed_input: 0,
            processed_output: 0,
        }
    }

    /// Installs state for `kind`. `workbuf` sizes the output window used
    /// internally when flushing to the sink; callers may reuse the same
    /// buffer across blocks.
    pub fn reset(&mut self, kind: CompressionKind) {
        self.codec = match kind {
            CompressionKind::None => Codec::Identity,
            CompressionKind::Deflate => {
                Codec::Deflate(Box::new(InflateState::new(DataFormat::Zlib)))
            }
            CompressionKind::Heatshrink11_4 => {
                Codec::Heatshrink(HeatshrinkDecoder::new(1 << 16, 11, 4))
            }
            CompressionKind::Heatshrink12_4 => {
                Codec::Heatshrink(HeatshrinkDecoder::new(1 << 16, 12, 4))
            }
        };
        self.state = State::Running;
        self.processed_input = 0;
        self.processed_output = 0;
    }

    pub fn processed_input_count(&self) -> u64 {
        self.processed_input
    }

    pub fn processed_output_count(&self) -> u64 {
        self.processed_output
    }

    pub fn is_failed(&self) -> bool {
        self.state == State::Failed
    }

    /// Feeds more compressed input; may call `sink` zero or more times.
    pub fn append(&mut self, sink: &mut dyn PayloadSink, source: &[u8], workbuf: &mut [u8]) -> Result<()> {
        self.drive(sink, source, workbuf, false)
    }

    /// Flushes remaining state with the last chunk of compressed input (may
    /// be empty) and tears the decompressor down to `Finished`.
    pub fn finish(&mut self, sink: &mut dyn PayloadSink, final_source: &[u8], workbuf: &mut [u8]) -> Result<()> {
        self.drive(sink, final_source, workbuf, true)?;
        if self.state != State::Failed {
            self.state = State::Finished;
        }
        Ok(())
    }

    fn drive(
        &mut self,
        sink: &mut dyn PayloadSink,
        source: &[u8],
        workbuf: &mut [u8],
        is_final: bool,
    ) -> Result<()> {
        if self.state == State::Failed {
            return Err(BgcodeError::DataUncompressionError("decompressor in failed state".into()));
        }

        let result = match &mut self.codec {
            Codec::Identity => {
                sink.consume(source)?;
                self.processed_input += source.len() as u64;
                self.processed_output += source.len() as u64;
                Ok(())
            }
            Codec::Deflate(state) => {
                let flush = if is_final { MZFlush::Finish } else { MZFlush::None };
                let mut input = source;
                loop {
                    let res = inflate(state, input, workbuf, flush);
                    self.processed_input += res.bytes_consumed as u64;
                    self.processed_output += res.bytes_written as u64;
                    if res.bytes_written > 0 {
                        sink.consume(&workbuf[..res.bytes_written])?;
                    }
                    input = &input[res.bytes_consumed..];
                    match res.status {
                        Ok(MZStatus::Ok) => {
                            if input.is_empty() && res.bytes_written == 0 {
                                break;
                            }
                        }
                        Ok(MZStatus::StreamEnd) => break,
                        Ok(MZStatus::NeedDict) | Err(_) => {
                            return Err(BgcodeError::DataUncompressionError(
                                "deflate stream error".into(),
                            ));
                        }
                    }
                    if input.is_empty() {
                        break;
                    }
                }
                Ok(())
            }
            Codec::Heatshrink(decoder) => {
                decoder
                    .sink(source)
                    .map_err(|_| BgcodeError::DataUncompressionError("heatshrink sink overflow".into()))?;
                self.processed_input += source.len() as u64;
                loop {
                    match decoder.poll(workbuf) {
                        HSDPollRes::More(n) => {
                            sink.consume(&workbuf[..n])?;
                            self.processed_output += n as u64;
                        }
                        HSDPollRes::Empty(n) => {
                            if n > 0 {
                                sink.consume(&workbuf[..n])?;
                                self.processed_output += n as u64;
                            }
                            break;
                        }
                        HSDPollRes::ErrorNull | HSDPollRes::ErrorUnknown => {
                            return Err(BgcodeError::DataUncompressionError(
                                "heatshrink decode error".into(),
                            ));
                        }
                    }
                }
                Ok(())
            }
        };

        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_passes_through_verbatim() {
        let mut d = Decompressor::new();
        d.reset(CompressionKind::None);
        let mut out = Vec::new();
        let mut workbuf = [0u8; 64];
        d.append(&mut |b: &[u8]| { out.extend_from_slice(b); Ok(()) }, b"hello world", &mut workbuf).unwrap();
        d.finish(&mut |b: &[u8]| { out.extend_from_slice(b); Ok(()) }, &[], &mut workbuf).unwrap();
        assert_eq!(out, b"hello world");
        assert_eq!(d.processed_input_count(), 11);
        assert_eq!(d.processed_output_count(), 11);
    }
}

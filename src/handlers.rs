//! Handler pipeline: composable parse-handlers wrapped like
//! middleware — outermost wraps innermost — plus the block-parse-handler
//! event sink invoked by [`crate::parse::parse_block`].
//!
//! The canonical reader composition, outside to inside:
//! `OrderChecking(ChecksumChecking(AllBlocks(Unpacking(application_block_handler))))`.

use crate::checksum::ChecksumVerifyingInput;
use crate::decompress::Decompressor;
use crate::error::{BgcodeError, Result};
use crate::header::{BlockHeader, BlockKind};
use crate::parse::{parse_block, skip_block};
use crate::stream::Input;

/// Cooperative cancellation signal returned by a [`BlockParseHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStatus {
    Ok,
    Stop,
}

/// Middleware contract: `handle_block` returns whether the block was
/// consumed and, if so, whether parsing may continue.
pub trait ParseHandler {
    fn handle_block(&mut self, input: &mut dyn Input, header: &BlockHeader) -> Result<bool>;
    fn can_continue(&self) -> bool {
        true
    }
}

/// Event sink invoked by `parse_block` for every field of one block.
pub trait BlockParseHandler {
    fn block_start(&mut self, header: &BlockHeader);
    fn int_param(&mut self, name: &str, value: i64, byte_width: usize);
    fn string_param(&mut self, _name: &str, _value: &str) {}
    fn float_param(&mut self, _name: &str, _value: f64) {}
    fn payload(&mut self, bytes: &[u8]);
    fn checksum(&mut self, _bytes: &[u8]) {}
    /// Size hint for payload chunk reads; `0` lets the driver pick its own
    /// fallback size.
    fn payload_chunk_size(&self) -> usize {
        0
    }
    fn status(&self) -> HandlerStatus {
        HandlerStatus::Ok
    }
}

// ── SkipperParseHandler ──────────────────────────────────────────────────────

/// Always reports the block as handled and skips it — used as the
/// terminal fallback of a pipeline that wants to discard everything.
pub struct SkipperParseHandler;

impl ParseHandler for SkipperParseHandler {
    fn handle_block(&mut self, input: &mut dyn Input, header: &BlockHeader) -> Result<bool> {
        skip_block(input, header)?;
        Ok(true)
    }
}

// ── OrderCheckingParseHandler ────────────────────────────────────────────────

pub struct OrderCheckingParseHandler<H: ParseHandler> {
    inner: H,
    previous: Option<BlockKind>,
}

impl<H: ParseHandler> OrderCheckingParseHandler<H> {
    pub fn new(inner: H) -> Self {
        Self { inner, previous: None }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: ParseHandler> ParseHandler for OrderCheckingParseHandler<H> {
    fn handle_block(&mut self, input: &mut dyn Input, header: &BlockHeader) -> Result<bool> {
        let allowed = match self.previous {
            None => BlockKind::START_SUCCESSORS.contains(&header.kind),
            Some(prev) => prev.allowed_successors().contains(&header.kind),
        };
        if !allowed {
            return Err(BgcodeError::InvalidSequenceOfBlocks);
        }
        self.previous = Some(header.kind);
        self.inner.handle_block(input, header)
    }

    fn can_continue(&self) -> bool {
        self.inner.can_continue()
    }
}

// ── ChecksumCheckingParseHandler ─────────────────────────────────────────────

pub struct ChecksumCheckingParseHandler<H: ParseHandler> {
    inner: H,
}

impl<H: ParseHandler> ChecksumCheckingParseHandler<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: ParseHandler> ParseHandler for ChecksumCheckingParseHandler<H> {
    fn handle_block(&mut self, input: &mut dyn Input, header: &BlockHeader) -> Result<bool> {
        let checksum_kind = input.metadata().checksum_kind;
        let mut adapter = ChecksumVerifyingInput::new(input, header, checksum_kind);

        let handled = self.inner.handle_block(&mut adapter, header)?;
        if !handled {
            let total = crate::header::block_content_size(checksum_kind, header);
            let remaining = total - adapter.bytes_read();
            let mut scratch = [0u8; 64];
            adapter.skip_draining(remaining, &mut scratch)?;
        }

        if checksum_kind != crate::header::ChecksumKind::None && !adapter.is_checksum_correct() {
            return Err(BgcodeError::InvalidChecksum);
        }
        Ok(true)
    }

    fn can_continue(&self) -> bool {
        self.inner.can_continue()
    }
}

// ── AllBlocksParseHandler ────────────────────────────────────────────────────

pub struct AllBlocksParseHandler<B: BlockParseHandler> {
    block_handler: B,
}

impl<B: BlockParseHandler> AllBlocksParseHandler<B> {
    pub fn new(block_handler: B) -> Self {
        Self { block_handler }
    }

    pub fn into_inner(self) -> B {
        self.block_handler
    }

    pub fn inner(&self) -> &B {
        &self.block_handler
    }
}

impl<B: BlockParseHandler> ParseHandler for AllBlocksParseHandler<B> {
    fn handle_block(&mut self, input: &mut dyn Input, header: &BlockHeader) -> Result<bool> {
        parse_block(input, header, &mut self.block_handler)?;
        Ok(true)
    }

    fn can_continue(&self) -> bool {
        self.block_handler.status() == HandlerStatus::Ok
    }
}

// ── UnpackingBlockParseHandler ───────────────────────────────────────────────

/// Interposes between the parse driver's `payload` calls and an inner
/// handler: decompresses each chunk before forwarding it.
pub struct UnpackingBlockParseHandler<B: BlockParseHandler> {
    inner: B,
    decompressor: Decompressor,
    workbuf: Vec<u8>,
    current_header: Option<BlockHeader>,
    bytes_fed: usize,
    total_compressed: usize,
    failed: bool,
}

impl<B: BlockParseHandler> UnpackingBlockParseHandler<B> {
    pub fn new(inner: B, workbuf_size: usize) -> Self {
        Self {
            inner,
            decompressor: Decompressor::new(),
            workbuf: vec![0u8; workbuf_size.max(64)],
            current_header: None,
            bytes_fed: 0,
            total_compressed: 0,
            failed: false,
        }
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: BlockParseHandler> BlockParseHandler for UnpackingBlockParseHandler<B> {
    fn block_start(&mut self, header: &BlockHeader) {
        self.decompressor.reset(header.compression);
        self.current_header = Some(*header);
        self.bytes_fed = 0;
        self.total_compressed = header.compressed_size as usize;
        self.failed = false;
        self.inner.block_start(header);
    }

    fn int_param(&mut self, name: &str, value: i64, byte_width: usize) {
        self.inner.int_param(name, value, byte_width);
    }

    fn string_param(&mut self, name: &str, value: &str) {
        self.inner.string_param(name, value);
    }

    fn float_param(&mut self, name: &str, value: f64) {
        self.inner.float_param(name, value);
    }

    fn payload(&mut self, bytes: &[u8]) {
        if self.failed {
            return;
        }
        self.bytes_fed += bytes.len();
        let is_last = self.bytes_fed >= self.total_compressed;

        let inner = &mut self.inner;
        let mut sink = |chunk: &[u8]| -> Result<()> {
            inner.payload(chunk);
            Ok(())
        };

        let result = if is_last {
            self.decompressor.finish(&mut sink, bytes, &mut self.workbuf)
        } else {
            self.decompressor.append(&mut sink, bytes, &mut self.workbuf)
        };
        if result.is_err() {
            self.failed = true;
        }
    }

    fn checksum(&mut self, bytes: &[u8]) {
        self.inner.checksum(bytes);
    }

    fn payload_chunk_size(&self) -> usize {
        self.inner.payload_chunk_size()
    }

    fn status(&self) -> HandlerStatus {
        if self.failed {
            HandlerStatus::Stop
        } else {
            self.inner.status()
        }
    }
}

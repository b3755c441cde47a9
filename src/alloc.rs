//! Allocator capability: a pluggable `{allocate, deallocate}` pair,
//! here realized as a trait producing owned buffers rather than raw
//! pointer-and-footer bookkeeping — see DESIGN.md for why.

/// Produces owned byte buffers. Every heap object exposed across the public
/// API that wants a caller-controlled allocation strategy goes through this
/// trait instead of calling `Vec::with_capacity` directly.
pub trait Allocator {
    fn alloc_buf(&self, len: usize) -> Vec<u8>;
}

/// Delegates straight to the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAllocator;

impl Allocator for DefaultAllocator {
    fn alloc_buf(&self, len: usize) -> Vec<u8> {
        vec![0u8; len]
    }
}

pub fn default_allocator() -> DefaultAllocator {
    DefaultAllocator
}

/// Monotonic bump allocator over a caller-owned arena. `buf` is the whole
/// backing store, supplied up front; `alloc_buf` carves successive
/// non-overlapping windows off its front and copies each one out as an
/// ordinary owned `Vec<u8>`. `deallocate` is a no-op until the
/// `StaticAllocator` itself drops, at which point the whole arena is freed
/// in one shot.
pub struct StaticAllocator {
    buf: Vec<u8>,
    offset: std::cell::Cell<usize>,
}

impl StaticAllocator {
    /// Takes ownership of `buf` as the arena. Exhausting it is a bug in the
    /// caller, not a recoverable condition — `alloc_buf` panics rather than
    /// silently growing past the buffer the caller chose to hand over.
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, offset: std::cell::Cell::new(0) }
    }
}

impl Allocator for StaticAllocator {
    fn alloc_buf(&self, len: usize) -> Vec<u8> {
        let start = self.offset.get();
        let end = start + len;
        assert!(end <= self.buf.len(), "StaticAllocator arena exhausted");
        self.offset.set(end);
        self.buf[start..end].to_vec()
    }
}

pub fn static_allocator(buf: Vec<u8>) -> StaticAllocator {
    StaticAllocator::new(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allocator_gives_zeroed_buffer() {
        let a = DefaultAllocator;
        let buf = a.alloc_buf(8);
        assert_eq!(buf, vec![0u8; 8]);
    }

    #[test]
    fn static_allocator_hands_out_independent_buffers() {
        let a = StaticAllocator::new(vec![0u8; 64]);
        let mut b1 = a.alloc_buf(4);
        let b2 = a.alloc_buf(4);
        b1[0] = 0xFF;
        assert_eq!(b2[0], 0);
    }

    #[test]
    #[should_panic(expected = "arena exhausted")]
    fn static_allocator_panics_past_its_buffer() {
        let a = StaticAllocator::new(vec![0u8; 4]);
        let _ = a.alloc_buf(8);
    }
}

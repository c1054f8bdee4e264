//! Uniform-buffer sub-allocator (spec §4.2).
use crate::backend::Backend;
use nyxgfx_base::Result;
use nyxgfx_common::align_up;

/// Bytes pushed to the sub-allocator are aligned up to this boundary before
/// `writeOffset` advances (spec §4.2).
pub const PUSH_ALIGNMENT: u64 = 256;

/// Default size of one allocator's backing buffer (spec §3: "fixed size
/// (spec default 1 MiB)").
pub const DEFAULT_ALLOCATOR_SIZE: u64 = 1024 * 1024;

/// A bump allocator carved from one host-visible backing buffer, drawn from
/// a device-owned pool and returned there on command-buffer cleanup.
#[derive(Debug)]
pub struct UniformAllocator<B: Backend> {
    buffer: B::Buffer,
    size: u64,
    write_offset: u64,
    draw_offset: u64,
}

impl<B: Backend> UniformAllocator<B> {
    pub fn new(buffer: B::Buffer, size: u64) -> Self {
        Self {
            buffer,
            size,
            write_offset: 0,
            draw_offset: 0,
        }
    }

    pub fn buffer(&self) -> &B::Buffer {
        &self.buffer
    }

    pub fn draw_offset(&self) -> u64 {
        self.draw_offset
    }

    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    /// Resets both offsets to zero. Called when an allocator is returned to
    /// the pool on command-buffer cleanup (spec §4.5 "Cleanup").
    pub fn reset(&mut self) {
        self.write_offset = 0;
        self.draw_offset = 0;
    }

    /// `true` if pushing `len` bytes right now would overflow this
    /// allocator's backing buffer.
    pub fn would_overflow(&self, len: u64) -> bool {
        self.write_offset + align_up(len, PUSH_ALIGNMENT) > self.size
    }

    /// Copies `bytes` at `write_offset`, sets `draw_offset := write_offset`,
    /// and advances `write_offset` by the 256-byte-aligned length (spec
    /// §4.2 step 3). The caller is responsible for checking
    /// [`would_overflow`](Self::would_overflow) first and swapping in a
    /// fresh allocator if necessary.
    pub fn push(&mut self, backend: &B, bytes: &[u8]) -> Result<()> {
        debug_assert!(!self.would_overflow(bytes.len() as u64));
        let ptr = backend.map_buffer(&self.buffer)?;
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.add(self.write_offset as usize), bytes.len());
        }
        backend.unmap_buffer(&self.buffer);
        self.draw_offset = self.write_offset;
        self.write_offset += align_up(bytes.len() as u64, PUSH_ALIGNMENT);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn would_overflow_accounts_for_alignment() {
        // A bare-bones fake: we only exercise the pure arithmetic here,
        // construction of a real UniformAllocator requires a backend.
        assert_eq!(align_up(1, PUSH_ALIGNMENT), 256);
        assert_eq!(align_up(256, PUSH_ALIGNMENT), 256);
        assert_eq!(align_up(257, PUSH_ALIGNMENT), 512);
    }
}

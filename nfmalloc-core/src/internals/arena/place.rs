//! Placement of an allocation within a free block.

use crate::{Configuration, Region, MINIMUM_BLOCK_SIZE};

use super::{Arena, Block};

impl<C, R> Arena<C, R>
    where
        C: Configuration,
        R: Region,
{
    /// Marks `block` as allocated, splitting off its tail as a free block if at least `MINIMUM_BLOCK_SIZE` bytes
    /// would remain past `size`.
    ///
    /// Returns the free remainder, if split.
    ///
    /// The remainder is not coalesced: the caller guarantees that the successor of `block` is allocated.
    pub(crate) fn place(&mut self, block: Block, size: usize) -> Option<Block> {
        let memory = self.region.memory_mut();
        let available = block.size(memory);

        debug_assert!(available >= size, "{:?} cannot hold {} bytes", block, size);

        if available - size < MINIMUM_BLOCK_SIZE {
            block.mark(memory, available, true);
            return None;
        }

        block.mark(memory, size, true);

        let remainder = block.next(memory);
        remainder.mark(memory, available - size, false);

        Some(remainder)
    }
}

//! Heap.
//!
//! A Heap manages a single, grow-only, Region as a sequence of blocks, each framed by a header and a footer tag.
//!
//! -   Allocation searches for a free block starting from where the previous search stopped (next-fit), wrapping
//!     around once, and only grows the Region when no free block fits.
//! -   Release coalesces the released block with its free neighbours, immediately.
//! -   Reallocation prefers resizing in place over moving the payload.
//!
//! A Heap is strictly single-threaded: every mutating operation requires `&mut self`.

use crate::internals::{arena::Arena, blocks::Block};

use super::{BlockInfo, BlockRef, Configuration, OutOfMemory, ReallocOutcome, Region, Statistics};

/// Heap.
///
/// All references handed out, `BlockRef`, are offsets within the Region and only meaningful for the Heap which
/// handed them out. Passing a reference to a Heap which did not hand it out, or passing a reference which was already
/// released, is a contract violation: it is detected, if at all, by debug assertions or `check`.
pub struct Heap<C, R>(Arena<C, R>);

impl<C, R> Heap<C, R>
    where
        C: Configuration,
        R: Region,
{
    /// Creates an uninitialized Heap.
    ///
    /// An uninitialized Heap refuses all allocations; see `init`.
    pub fn new(region: R) -> Self { Self(Arena::new(region)) }

    /// Creates an initialized Heap.
    pub fn with_region(region: R) -> Result<Self, OutOfMemory> {
        let mut heap = Self::new(region);
        heap.init()?;

        Ok(heap)
    }

    /// Initializes the Heap, writing the sentinels and requesting a first chunk of memory from the Region.
    ///
    /// Calling `init` on an initialized Heap is a no-op.
    ///
    /// #   Errors
    ///
    /// Returns an error if the Region refused to grow. If the Region granted the sentinels but not the first chunk,
    /// the Heap is initialized nonetheless, and will request memory again on the first allocation.
    pub fn init(&mut self) -> Result<(), OutOfMemory> { self.0.initialize() }

    /// Returns whether the Heap is initialized.
    pub fn is_initialized(&self) -> bool { self.0.is_initialized() }

    /// Returns a reference to the Region.
    pub fn region(&self) -> &R { self.0.region() }

    /// Allocates a block able to hold at least `size` bytes.
    ///
    /// The payload is aligned on `ALIGNMENT`, relative to the start of the Region; its content is unspecified.
    ///
    /// Returns None if `size` is 0, if the Heap is not initialized, or if the Region refused to grow, or would grow
    /// past `MAXIMUM_HEAP_SIZE`.
    pub fn allocate(&mut self, size: usize) -> Option<BlockRef> { self.0.allocate(size).map(Block::into_ref) }

    /// Releases the block, making its memory available for further allocations.
    ///
    /// #   Panics
    ///
    /// In Debug, if the block is not allocated.
    pub fn release(&mut self, block: BlockRef) { self.0.release(Block::from_ref(block)) }

    /// Resizes the block to hold at least `size` bytes, preserving its content up to the smaller of the two sizes.
    ///
    /// -   If `block` is None, behaves as `allocate`, mapping None to `Failed`.
    /// -   If `size` is 0, releases the block and returns `Unusable`.
    /// -   On `Failed`, the block is untouched, and still allocated.
    pub fn reallocate(&mut self, block: Option<BlockRef>, size: usize) -> ReallocOutcome {
        self.0.reallocate(block.map(Block::from_ref), size)
    }

    /// Checks the consistency of the Heap.
    ///
    /// Returns false, after emitting a warning describing the first inconsistency, if the Heap is corrupted.
    pub fn check(&self) -> bool { self.0.check() }

    /// Returns the payload of the block.
    ///
    /// #   Panics
    ///
    /// If the block lies outside the Region.
    pub fn payload(&self, block: BlockRef) -> &[u8] { self.0.payload(Block::from_ref(block)) }

    /// Returns the payload of the block.
    ///
    /// #   Panics
    ///
    /// If the block lies outside the Region.
    pub fn payload_mut(&mut self, block: BlockRef) -> &mut [u8] { self.0.payload_mut(Block::from_ref(block)) }

    /// Returns the number of bytes the block can hold, at least as many as were requested.
    pub fn capacity_of(&self, block: BlockRef) -> usize { self.0.capacity(Block::from_ref(block)) }

    /// Returns the blocks, in address order, sentinels excluded.
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ { self.0.blocks() }

    /// Returns a summary of the blocks.
    pub fn statistics(&self) -> Statistics { self.0.statistics() }
}

impl<C, R> Default for Heap<C, R>
    where
        C: Configuration,
        R: Region + Default,
{
    fn default() -> Self { Self::new(R::default()) }
}

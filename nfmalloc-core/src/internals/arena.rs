//! Arena
//!
//! An Arena carves a Region into a sequence of blocks, bounded by two sentinels:
//!
//! ```text
//!     | padding | prologue hdr | prologue ftr | block | block | ... | block | epilogue hdr |
//!     ^ start                                 ^ first                                     ^ hi
//! ```
//!
//! The prologue and epilogue are always allocated, so that coalescing never needs to check for the edges of the
//! region. Free blocks are not linked: they are found by walking the blocks, starting from a roving cursor.

mod check;
mod coalesce;
mod fit;
mod place;
mod realloc;


use core::{iter, marker};

use crate::{BlockInfo, Configuration, OutOfMemory, Properties, Region, Statistics};
use crate::{ALIGNMENT, MAXIMUM_HEAP_SIZE, WORD_SIZE};
use crate::utils;

use super::{blocks::Block, tag::{self, Tag}};

/// Arena.
pub(crate) struct Arena<C, R> {
    region: R,
    //  Offset of the padding word, once initialized.
    start: Option<usize>,
    //  Block from which the next search starts; always a block boundary, possibly the epilogue.
    cursor: Block,
    _configuration: marker::PhantomData<C>,
}

impl<C, R> Arena<C, R>
    where
        C: Configuration,
        R: Region,
{
    /// Size of the sentinels: padding word, prologue header and footer, epilogue header.
    const SENTINELS_SIZE: usize = 4 * WORD_SIZE;

    /// Creates an uninitialized instance.
    pub(crate) fn new(region: R) -> Self {
        debug_assert!(Properties::<C>::is_valid(), "Invalid configuration, chunk size: {}", C::CHUNK_SIZE);

        //  The cursor is only meaningful once initialized; `2 * ALIGNMENT` is the first block of an empty region.
        let cursor = Block::new(2 * ALIGNMENT.value());

        Self { region, start: None, cursor, _configuration: marker::PhantomData }
    }

    /// Returns a reference to the region.
    pub(crate) fn region(&self) -> &R { &self.region }

    /// Returns whether the arena is initialized.
    pub(crate) fn is_initialized(&self) -> bool { self.start.is_some() }

    /// Initializes the arena, writing the sentinels and seeding the region with a first free block.
    ///
    /// Calling `initialize` on an initialized arena is a no-op.
    pub(crate) fn initialize(&mut self) -> Result<(), OutOfMemory> {
        if self.is_initialized() {
            return Ok(());
        }

        let start = self.region.grow(Self::SENTINELS_SIZE).ok_or(OutOfMemory)?;

        debug_assert!(utils::is_aligned(start, ALIGNMENT), "Misaligned region start: {}", start);

        let prologue = Block::new(start + ALIGNMENT.value());
        let first = Block::new(start + 2 * ALIGNMENT.value());

        {
            let memory = self.region.memory_mut();

            tag::write(memory, start, Tag::PADDING);
            prologue.mark(memory, ALIGNMENT.value(), true);
            first.mark_epilogue(memory);
        }

        self.start = Some(start);
        self.cursor = first;

        tracing::debug!(start, chunk = C::CHUNK_SIZE, "initialized arena");

        self.extend(Properties::<C>::initial_words()).map(|_| ()).ok_or(OutOfMemory)
    }

    /// Returns the prologue, once initialized.
    pub(crate) fn prologue(&self) -> Option<Block> { self.start.map(|start| Block::new(start + ALIGNMENT.value())) }

    /// Returns the first block after the prologue, possibly the epilogue.
    pub(crate) fn first(&self) -> Option<Block> { self.start.map(|start| Block::new(start + 2 * ALIGNMENT.value())) }

    /// Returns the cursor.
    pub(crate) fn cursor(&self) -> Block { self.cursor }

    /// Grows the region by `words` words, rounded up to an even number, as a new free block.
    ///
    /// Returns the new free block, coalesced with its predecessor if the latter was free, or None if the region
    /// could not grow, or if the heap would span more than `MAXIMUM_HEAP_SIZE` bytes.
    pub(crate) fn extend(&mut self, words: usize) -> Option<Block> {
        let start = self.start?;
        let size = utils::round_up_to_even(words).checked_mul(WORD_SIZE)?;

        if size == 0 {
            return None;
        }

        let previous_hi = self.region.hi();

        //  Merged blocks never exceed the span of the heap, which must therefore fit in a tag word.
        if previous_hi.checked_add(size).map_or(true, |hi| hi - start > MAXIMUM_HEAP_SIZE) {
            tracing::debug!(size, hi = previous_hi, "heap would exceed its maximum size");
            return None;
        }

        let offset = match self.region.grow(size) {
            Some(offset) => offset,
            None => {
                tracing::debug!(size, hi = previous_hi, "region refused to grow");
                return None;
            },
        };

        debug_assert_eq!(previous_hi, offset, "Region grew non-contiguously");

        tracing::trace!(size, offset, "extended region");

        //  The header of the new block overwrites the former epilogue.
        let block = Block::new(offset);

        {
            let memory = self.region.memory_mut();

            block.mark(memory, size, false);
            block.next(memory).mark_epilogue(memory);
        }

        Some(self.coalesce(block))
    }

    /// Allocates a block able to hold `requested` bytes.
    ///
    /// Returns None if `requested` is 0, the arena is not initialized, or the region cannot grow.
    pub(crate) fn allocate(&mut self, requested: usize) -> Option<Block> {
        if !self.is_initialized() {
            return None;
        }

        let size = Properties::<C>::adjust_size(requested)?;

        let block = match self.find(size) {
            Some(block) => block,
            None => {
                tracing::trace!(size, "no fit, extending");
                self.extend(Properties::<C>::extension_words(size))?
            },
        };

        self.place(block, size);

        Some(block)
    }

    /// Releases the block, coalescing it with its free neighbours.
    pub(crate) fn release(&mut self, block: Block) {
        let memory = self.region.memory_mut();

        debug_assert!(block.is_allocated(memory), "Double release of {:?}", block);

        let size = block.size(memory);
        block.mark(memory, size, false);

        self.coalesce(block);
    }

    /// Returns the payload of the block.
    pub(crate) fn payload(&self, block: Block) -> &[u8] {
        let memory = self.region.memory();
        let capacity = block.capacity(memory);

        &memory[block.offset()..block.offset() + capacity]
    }

    /// Returns the payload of the block.
    pub(crate) fn payload_mut(&mut self, block: Block) -> &mut [u8] {
        let memory = self.region.memory_mut();
        let capacity = block.capacity(memory);

        &mut memory[block.offset()..block.offset() + capacity]
    }

    /// Returns the number of payload bytes the block can hold.
    pub(crate) fn capacity(&self, block: Block) -> usize { block.capacity(self.region.memory()) }

    /// Returns an iterator over the blocks, in address order, sentinels excluded.
    pub(crate) fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        let memory = self.region.memory();

        iter::successors(self.first(), move |block| Some(block.next(memory)))
            .take_while(move |block| !block.is_epilogue(memory))
            .map(move |block| {
                let tag = block.tag(memory);
                BlockInfo { payload: block.offset(), size: tag.size(), allocated: tag.is_allocated() }
            })
    }

    /// Returns statistics about the blocks.
    pub(crate) fn statistics(&self) -> Statistics {
        let initial = Statistics { region_bytes: self.region.hi() - self.region.lo(), ..Statistics::default() };

        self.blocks().fold(initial, |mut statistics, block| {
            if block.allocated {
                statistics.allocated_blocks += 1;
                statistics.allocated_bytes += block.size;
            } else {
                statistics.free_blocks += 1;
                statistics.free_bytes += block.size;
                statistics.largest_free = statistics.largest_free.max(block.size);
            }

            statistics
        })
    }

    //  Moves the cursor back to the start of `block`, if it pointed strictly within `block` once resized to `size`.
    fn repair_cursor(&mut self, block: Block, size: usize) {
        if block.contains(size, self.cursor.offset()) {
            self.cursor = block;
        }
    }

    //  Returns the memory, for internal consumption.
    #[cfg(test)]
    fn memory_mut(&mut self) -> &mut [u8] { self.region.memory_mut() }
}

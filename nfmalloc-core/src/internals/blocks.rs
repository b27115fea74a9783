//! Navigation between blocks.
//!
//! A block is designated by the offset of its payload. Its header is the word immediately before, its footer the word
//! immediately before its successor:
//!
//! ```text
//!     | header |        payload        | footer | header |  ...
//!              ^                                         ^
//!              block                                     block.next()
//! ```

use crate::{BlockRef, ALIGNMENT, OVERHEAD, WORD_SIZE};

use super::tag::{self, Tag};

/// Block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) struct Block(usize);

impl Block {
    /// Creates an instance.
    pub(crate) fn new(offset: usize) -> Self {
        debug_assert!(offset % ALIGNMENT == 0, "Misaligned block: {}", offset);
        debug_assert!(offset >= 2 * WORD_SIZE, "Block {} precedes its region", offset);

        Self(offset)
    }

    /// Creates an instance from the user-facing reference.
    pub(crate) fn from_ref(block: BlockRef) -> Self { Self::new(block.offset()) }

    /// Returns the user-facing reference.
    pub(crate) fn into_ref(self) -> BlockRef {
        //  Safety:
        //  -   A block is preceded by at least its header.
        unsafe { BlockRef::new_unchecked(self.0) }
    }

    /// Returns the offset of the payload.
    pub(crate) fn offset(&self) -> usize { self.0 }

    /// Returns the offset of the header.
    pub(crate) fn header(&self) -> usize { self.0 - WORD_SIZE }

    /// Returns the offset of the footer.
    pub(crate) fn footer(&self, memory: &[u8]) -> usize { self.0 + self.size(memory) - OVERHEAD }

    /// Returns the tag stored in the header.
    pub(crate) fn tag(&self, memory: &[u8]) -> Tag { tag::read(memory, self.header()) }

    /// Returns the tag stored in the footer.
    pub(crate) fn footer_tag(&self, memory: &[u8]) -> Tag { tag::read(memory, self.footer(memory)) }

    /// Returns the size of the block, overhead included.
    pub(crate) fn size(&self, memory: &[u8]) -> usize { self.tag(memory).size() }

    /// Returns whether the block is allocated.
    pub(crate) fn is_allocated(&self, memory: &[u8]) -> bool { self.tag(memory).is_allocated() }

    /// Returns whether this is the epilogue, the only block of size 0.
    pub(crate) fn is_epilogue(&self, memory: &[u8]) -> bool { self.size(memory) == 0 }

    /// Returns the number of payload bytes the block can hold.
    pub(crate) fn capacity(&self, memory: &[u8]) -> usize { self.size(memory) - OVERHEAD }

    /// Returns the successor of this block.
    pub(crate) fn next(&self, memory: &[u8]) -> Block { Block(self.0 + self.size(memory)) }

    /// Returns the tag of the predecessor of this block, as stored in its footer.
    pub(crate) fn previous_tag(&self, memory: &[u8]) -> Tag { tag::read(memory, self.0 - OVERHEAD) }

    /// Returns the predecessor of this block.
    pub(crate) fn previous(&self, memory: &[u8]) -> Block { Block(self.0 - self.previous_tag(memory).size()) }

    /// Returns whether `offset` lies strictly within this block, once resized to `size`.
    ///
    /// The start of the block itself is not considered within.
    pub(crate) fn contains(&self, size: usize, offset: usize) -> bool { offset > self.0 && offset < self.0 + size }

    /// Tags the block, both header and footer, with the given size and flag.
    pub(crate) fn mark(&self, memory: &mut [u8], size: usize, allocated: bool) {
        debug_assert!(size >= OVERHEAD, "Block {} is too small to be tagged: {}", self.0, size);

        let tag = Tag::new(size, allocated);

        tag::write(memory, self.header(), tag);
        tag::write(memory, self.0 + size - OVERHEAD, tag);
    }

    /// Tags the block as the epilogue: a header only, of size 0, allocated.
    pub(crate) fn mark_epilogue(&self, memory: &mut [u8]) { tag::write(memory, self.header(), Tag::EPILOGUE) }
}

#[cfg(test)]
mod tests {

use super::*;

//  Layout:
//  -   0: padding.
//  -   8: prologue, 8 bytes.
//  -   16: allocated block, 24 bytes.
//  -   40: free block, 32 bytes.
//  -   72: epilogue.
fn create_memory() -> [u8; 72] {
    let mut memory = [0u8; 72];

    Block::new(8).mark(&mut memory, 8, true);
    Block::new(16).mark(&mut memory, 24, true);
    Block::new(40).mark(&mut memory, 32, false);
    Block::new(72).mark_epilogue(&mut memory);

    memory
}

#[test]
fn block_header_footer() {
    let memory = create_memory();
    let block = Block::new(16);

    assert_eq!(12, block.header());
    assert_eq!(32, block.footer(&memory));
    assert_eq!(Tag::new(24, true), block.tag(&memory));
    assert_eq!(block.tag(&memory), block.footer_tag(&memory));
    assert_eq!(16, block.capacity(&memory));
}

#[test]
fn block_navigation() {
    let memory = create_memory();

    let prologue = Block::new(8);
    let allocated = prologue.next(&memory);
    let free = allocated.next(&memory);
    let epilogue = free.next(&memory);

    assert_eq!(Block::new(16), allocated);
    assert_eq!(Block::new(40), free);
    assert_eq!(Block::new(72), epilogue);

    assert!(epilogue.is_epilogue(&memory));
    assert!(epilogue.is_allocated(&memory));
    assert!(!free.is_allocated(&memory));

    assert_eq!(free, epilogue.previous(&memory));
    assert_eq!(allocated, free.previous(&memory));
    assert_eq!(prologue, allocated.previous(&memory));
}

#[test]
fn block_contains() {
    let block = Block::new(16);

    assert!(!block.contains(24, 8));
    assert!(!block.contains(24, 16));
    assert!(block.contains(24, 24));
    assert!(block.contains(24, 32));
    assert!(!block.contains(24, 40));
}

#[test]
fn block_ref_round_trip() {
    let block = Block::new(40);

    assert_eq!(40, block.into_ref().offset());
    assert_eq!(block, Block::from_ref(block.into_ref()));
}

}

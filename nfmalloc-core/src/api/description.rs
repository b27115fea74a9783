//! Description of the blocks, and of the outcomes of the various operations.

use core::{fmt, num};

pub use crate::utils::PowerOf2;

/// Size of a tag word, in bytes.
///
/// Each block starts with a header word and ends with a footer word, both holding the same tag.
pub const WORD_SIZE: usize = 4;

/// Alignment of both block sizes and payloads.
//  Safety:
//  -   8 is a power of 2.
pub const ALIGNMENT: PowerOf2 = unsafe { PowerOf2::new_unchecked(2 * WORD_SIZE) };

/// Bookkeeping overhead of a block: its header and footer.
pub const OVERHEAD: usize = 2 * WORD_SIZE;

/// Minimum size of a block, header and footer included.
///
/// A smaller remainder is never split off, it is left as internal fragmentation instead.
pub const MINIMUM_BLOCK_SIZE: usize = 2 * ALIGNMENT.value();

/// Maximum size of a block, header and footer included.
///
/// The size is stored in a 32-bits tag word, with the 3 lower bits reserved.
pub const MAXIMUM_BLOCK_SIZE: usize = (u32::MAX as usize) & !0b111;

/// Maximum span of a heap within its region, sentinels included.
///
/// Any block, however many neighbours it is merged with, lies within the span, and therefore fits in a tag word.
pub const MAXIMUM_HEAP_SIZE: usize = MAXIMUM_BLOCK_SIZE;

/// BlockRef
///
/// A reference to the payload of an allocated block, as an offset from the start of the region.
///
/// The offset is never 0: the region always starts with a padding word and the prologue.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BlockRef(num::NonZeroUsize);

impl BlockRef {
    /// Creates a new instance, or nothing if `offset` is 0.
    pub fn new(offset: usize) -> Option<BlockRef> { num::NonZeroUsize::new(offset).map(BlockRef) }

    /// Creates a new instance.
    ///
    /// #   Safety
    ///
    /// Assumes that `offset` is not 0.
    pub const unsafe fn new_unchecked(offset: usize) -> BlockRef { BlockRef(num::NonZeroUsize::new_unchecked(offset)) }

    /// Returns the offset of the payload within the region.
    pub const fn offset(&self) -> usize { self.0.get() }
}

/// ReallocOutcome
///
/// The outcome of a reallocation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ReallocOutcome {
    /// The block now lives at this reference; possibly the original one.
    NewRef(BlockRef),
    /// The block was released, following a request for 0 bytes.
    ///
    /// This is distinct from a failure: the original reference is no longer usable.
    Unusable,
    /// The request could not be satisfied; the original block is untouched, and still allocated.
    Failed,
}

impl ReallocOutcome {
    /// Returns the new reference, if any.
    pub fn block(&self) -> Option<BlockRef> {
        match self {
            ReallocOutcome::NewRef(block) => Some(*block),
            _ => None,
        }
    }
}

/// BlockInfo
///
/// A snapshot of a single block, as seen when walking the region.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct BlockInfo {
    /// Offset of the payload.
    pub payload: usize,
    /// Size of the block, header and footer included.
    pub size: usize,
    /// Whether the block is allocated.
    pub allocated: bool,
}

/// Statistics
///
/// A summary of the blocks of a heap, used to assess utilization and fragmentation.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Statistics {
    /// Number of bytes obtained from the region provider.
    pub region_bytes: usize,
    /// Number of allocated blocks.
    pub allocated_blocks: usize,
    /// Number of bytes in allocated blocks, overhead included.
    pub allocated_bytes: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Number of bytes in free blocks, overhead included.
    pub free_bytes: usize,
    /// Size of the largest free block, overhead included.
    pub largest_free: usize,
}

/// OutOfMemory
///
/// The region provider could not supply the memory requested.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct OutOfMemory;

impl fmt::Display for OutOfMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the region provider refused to grow the heap")
    }
}

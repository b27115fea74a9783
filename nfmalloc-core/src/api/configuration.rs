//! The configuration of nfmalloc-core.
//!
//! A Heap requests memory from its Region in two circumstances:
//!
//! -   Eagerly, upon initialization, to seed the heap with a first free block.
//! -   Lazily, whenever no free block is large enough to satisfy an allocation.
//!
//! The Configuration instance allows adjusting how much memory is requested in either case.

use core::{cmp, marker};

use super::{ALIGNMENT, MAXIMUM_BLOCK_SIZE, MINIMUM_BLOCK_SIZE, OVERHEAD, WORD_SIZE};

/// Configuration
///
/// The Configuration instance allows adjusting the growth of the heap.
pub trait Configuration {
    /// The number of bytes the region is grown by, at least, when no free block fits.
    ///
    /// Must be a multiple of `ALIGNMENT`, and at least `MINIMUM_BLOCK_SIZE`.
    const CHUNK_SIZE: usize;
}

/// The default configuration, growing by 4 KB at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConfiguration;

impl Configuration for DefaultConfiguration {
    const CHUNK_SIZE: usize = 1 << 12;
}

/// Properties
///
/// Properties of a given Configuration.
///
/// Work-around for the inability to implement static methods directly on a trait.
pub struct Properties<C>(marker::PhantomData<C>);

impl<C> Properties<C>
    where
        C: Configuration
{
    /// Returns whether the configuration is usable.
    pub fn is_valid() -> bool {
        C::CHUNK_SIZE % ALIGNMENT == 0 && C::CHUNK_SIZE >= MINIMUM_BLOCK_SIZE && C::CHUNK_SIZE <= MAXIMUM_BLOCK_SIZE
    }

    /// Returns the size of the block required to hold `requested` bytes of payload, overhead included.
    ///
    /// Returns None if `requested` is 0, or if the block would exceed `MAXIMUM_BLOCK_SIZE`.
    pub fn adjust_size(requested: usize) -> Option<usize> {
        if requested == 0 {
            return None;
        }

        if requested <= ALIGNMENT.value() {
            return Some(MINIMUM_BLOCK_SIZE);
        }

        requested.checked_add(OVERHEAD)
            .and_then(|size| ALIGNMENT.checked_round_up(size))
            .filter(|size| *size <= MAXIMUM_BLOCK_SIZE)
    }

    /// Returns the number of words to grow the region by, when no free block can hold `adjusted` bytes.
    pub fn extension_words(adjusted: usize) -> usize { cmp::max(adjusted, C::CHUNK_SIZE) / WORD_SIZE }

    /// Returns the number of words the region is seeded with.
    pub fn initial_words() -> usize { C::CHUNK_SIZE / WORD_SIZE }
}
